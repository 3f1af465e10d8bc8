//! Severity-ordered admission queue.
//!
//! A binary heap keyed by `(tier, tie_key)`. The tier decides first; among
//! equal tiers the queue-level [`TieBreakPolicy`] turns the insertion sequence
//! number into a tie key so one comparator serves both FIFO and LIFO service.
//! Sequence numbers are unique, so the order is total and
//! [`TriageQueue::snapshot_ordered`] matches repeated extraction exactly.

pub mod shared;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classifier::{classify, Classification, Questionnaire, RawAnswers, SeverityTier};
use crate::error::EngineError;
use crate::params::SeverityParams;

pub use shared::SharedTriageQueue;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ordering among patients of equal tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieBreakPolicy {
    /// Lower sequence number first (queue).
    #[default]
    OldestFirst,
    /// Higher sequence number first (stack).
    NewestFirst,
}

impl TieBreakPolicy {
    /// Larger keys are served first.
    fn tie_key(self, sequence: u64) -> u64 {
        match self {
            TieBreakPolicy::OldestFirst => u64::MAX - sequence,
            TieBreakPolicy::NewestFirst => sequence,
        }
    }
}

/// A waiting patient. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    id: String,
    tier: SeverityTier,
    score: u32,
    answers: Questionnaire,
    sequence: u64,
}

impl Patient {
    /// Caller-supplied identifier; not necessarily unique.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tier(&self) -> SeverityTier {
        self.tier
    }

    /// Raw severity score. Audit only; never used for ordering.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answers(&self) -> &Questionnaire {
        &self.answers
    }

    /// Insertion sequence number, unique within the owning queue.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// One row of the waiting-list table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRow {
    /// 1-based service position.
    pub position: usize,
    pub patient_id: String,
    pub tier: SeverityTier,
    pub score: u32,
}

#[derive(Debug, Clone)]
struct QueueEntry {
    tier: SeverityTier,
    tie_key: u64,
    patient: Patient,
}

impl QueueEntry {
    fn rank(&self) -> (SeverityTier, u64) {
        (self.tier, self.tie_key)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// TriageQueue
// ---------------------------------------------------------------------------

/// The admission queue. One instance per emergency room; owned explicitly
/// (as an ECS resource, behind a [`SharedTriageQueue`], or as a plain value).
#[derive(Resource, Debug, Clone, Default)]
pub struct TriageQueue {
    heap: BinaryHeap<QueueEntry>,
    next_sequence: u64,
    policy: TieBreakPolicy,
}

impl TriageQueue {
    pub fn new(policy: TieBreakPolicy) -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
            policy,
        }
    }

    /// Enqueue an already-classified patient and return its sequence number.
    /// Duplicate ids are fine: identity is the sequence number.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        classification: Classification,
        answers: Questionnaire,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueueEntry {
            tier: classification.tier,
            tie_key: self.policy.tie_key(sequence),
            patient: Patient {
                id: id.into(),
                tier: classification.tier,
                score: classification.score,
                answers,
                sequence,
            },
        });
        sequence
    }

    /// Classify raw answers and enqueue. On `InvalidInput` nothing changes,
    /// not even the sequence counter.
    pub fn admit(
        &mut self,
        id: impl Into<String>,
        answers: &RawAnswers,
        params: &SeverityParams,
    ) -> Result<u64, EngineError> {
        let (questionnaire, classification) = classify(answers, params)?;
        Ok(self.insert(id, classification, questionnaire))
    }

    /// Remove and return the next patient to serve. `None` when nobody is
    /// waiting; calling again is harmless.
    pub fn extract_highest(&mut self) -> Option<Patient> {
        self.heap.pop().map(|entry| entry.patient)
    }

    /// The next patient to serve, without removing it.
    pub fn peek(&self) -> Option<&Patient> {
        self.heap.peek().map(|entry| &entry.patient)
    }

    /// Every waiting patient in service order. Does not mutate the queue.
    pub fn snapshot_ordered(&self) -> Vec<Patient> {
        let mut entries: Vec<&QueueEntry> = self.heap.iter().collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| e.patient.clone()).collect()
    }

    /// The waiting list in the shape the dashboard renders.
    pub fn snapshot_rows(&self) -> Vec<QueueRow> {
        self.snapshot_ordered()
            .into_iter()
            .enumerate()
            .map(|(i, p)| QueueRow {
                position: i + 1,
                patient_id: p.id,
                tier: p.tier,
                score: p.score,
            })
            .collect()
    }

    pub fn policy(&self) -> TieBreakPolicy {
        self.policy
    }

    /// Switch the tie-break rule for present and future entries. Tier order
    /// is unaffected. O(n) re-heapify.
    pub fn set_policy(&mut self, policy: TieBreakPolicy) {
        if policy == self.policy {
            return;
        }
        self.policy = policy;
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        for entry in &mut entries {
            entry.tie_key = policy.tie_key(entry.patient.sequence);
        }
        self.heap = BinaryHeap::from(entries);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Sequence number the next insert will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
