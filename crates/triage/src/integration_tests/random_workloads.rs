//! Seeded random workloads checked against a simple reference model.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::classifier::{classify, RawAnswers, SeverityTier};
use crate::params::SeverityParams;
use crate::queue::{TieBreakPolicy, TriageQueue};
use crate::test_harness::TestEngine;

const CONSCIOUSNESS: [&str; 4] = ["alert", "verbal", "pain", "unresponsive"];
const BREATHING: [&str; 3] = ["normal", "laboured", "critical"];
const BLEEDING: [&str; 4] = ["none", "mild", "moderate", "severe"];
const TRAUMA: [&str; 3] = ["none", "minor", "major"];

fn random_answers(rng: &mut ChaCha8Rng) -> RawAnswers {
    RawAnswers::new(
        CONSCIOUSNESS[rng.gen_range(0..CONSCIOUSNESS.len())],
        BREATHING[rng.gen_range(0..BREATHING.len())],
        BLEEDING[rng.gen_range(0..BLEEDING.len())],
        TRAUMA[rng.gen_range(0..TRAUMA.len())],
    )
}

/// Unsorted list; extraction scans for the winner.
#[derive(Default)]
struct ReferenceQueue {
    waiting: Vec<(SeverityTier, u64, String)>,
}

impl ReferenceQueue {
    fn extract(&mut self, policy: TieBreakPolicy) -> Option<String> {
        let best = (0..self.waiting.len()).max_by(|&a, &b| {
            let (ta, sa, _) = &self.waiting[a];
            let (tb, sb, _) = &self.waiting[b];
            let arrival = match policy {
                TieBreakPolicy::OldestFirst => sb.cmp(sa),
                TieBreakPolicy::NewestFirst => sa.cmp(sb),
            };
            ta.cmp(tb).then(arrival)
        })?;
        Some(self.waiting.swap_remove(best).2)
    }
}

fn run_against_reference(seed: u64, policy: TieBreakPolicy) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let params = SeverityParams::default();
    let mut queue = TriageQueue::new(policy);
    let mut reference = ReferenceQueue::default();

    for step in 0..2_000 {
        if rng.gen_bool(0.6) {
            let answers = random_answers(&mut rng);
            let id = format!("p{step}");
            let seq = queue.admit(id.clone(), &answers, &params).unwrap();
            let (_, classification) = classify(&answers, &params).unwrap();
            reference.waiting.push((classification.tier, seq, id));
        } else {
            let got = queue.extract_highest().map(|p| p.id().to_string());
            assert_eq!(got, reference.extract(policy), "seed {seed}, step {step}");
        }
        assert_eq!(queue.len(), reference.waiting.len());
    }

    // Snapshot matches a full drain.
    let snapshot: Vec<String> = queue
        .snapshot_ordered()
        .into_iter()
        .map(|p| p.id().to_string())
        .collect();
    let drained: Vec<String> = std::iter::from_fn(|| queue.extract_highest())
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(snapshot, drained, "seed {seed}");
    let expected: Vec<String> = std::iter::from_fn(|| reference.extract(policy)).collect();
    assert_eq!(drained, expected, "seed {seed}");
}

#[test]
fn random_workload_oldest_first() {
    for seed in [1, 7, 42, 2024] {
        run_against_reference(seed, TieBreakPolicy::OldestFirst);
    }
}

#[test]
fn random_workload_newest_first() {
    for seed in [3, 11, 99] {
        run_against_reference(seed, TieBreakPolicy::NewestFirst);
    }
}

#[test]
fn random_policy_switches_keep_heap_consistent() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
    let params = SeverityParams::default();
    let mut queue = TriageQueue::default();
    for i in 0..300 {
        queue.admit(format!("p{i}"), &random_answers(&mut rng), &params).unwrap();
        if rng.gen_bool(0.05) {
            let next = match queue.policy() {
                TieBreakPolicy::OldestFirst => TieBreakPolicy::NewestFirst,
                TieBreakPolicy::NewestFirst => TieBreakPolicy::OldestFirst,
            };
            queue.set_policy(next);
        }
    }

    let snapshot = queue.snapshot_ordered();
    assert_eq!(snapshot.len(), 300);
    for pair in snapshot.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.tier() >= b.tier());
        if a.tier() == b.tier() {
            match queue.policy() {
                TieBreakPolicy::OldestFirst => assert!(a.sequence() < b.sequence()),
                TieBreakPolicy::NewestFirst => assert!(a.sequence() > b.sequence()),
            }
        }
    }
}

#[test]
fn random_ecs_workload_dispatches_in_priority_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut engine = TestEngine::new();
    for i in 0..100 {
        engine.admit(format!("p{i}"), random_answers(&mut rng));
    }
    engine.tick(1);
    engine.assert_waiting(100);

    let expected: Vec<String> = engine
        .queue()
        .snapshot_rows()
        .into_iter()
        .map(|row| row.patient_id)
        .collect();
    let dispatched: Vec<String> = (0..100)
        .filter_map(|_| engine.dispatch_one())
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(dispatched, expected);
    assert_eq!(engine.dispatch_log().len(), 64);
}
