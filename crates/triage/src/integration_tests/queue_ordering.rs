//! Queue ordering through the ECS intake and dispatch systems.

use crate::classifier::{RawAnswers, SeverityTier};
use crate::params::EngineParams;
use crate::queue::TieBreakPolicy;
use crate::test_harness::TestEngine;

const SEVERE: [&str; 4] = ["pain", "normal", "none", "none"];
const CRITICAL: [&str; 4] = ["unresponsive", "critical", "none", "none"];
const MODERATE: [&str; 4] = ["verbal", "normal", "none", "none"];
const MILD: [&str; 4] = ["alert", "normal", "none", "none"];

fn newest_first() -> EngineParams {
    let mut params = EngineParams::default();
    params.severity.tie_break = TieBreakPolicy::NewestFirst;
    params
}

#[test]
fn oldest_first_dispatch_order() {
    let mut engine =
        TestEngine::new().with_patients(&[("P1", SEVERE), ("P2", CRITICAL), ("P3", SEVERE)]);
    engine.assert_order(&["P2", "P1", "P3"]);

    let order: Vec<String> = (0..3)
        .filter_map(|_| engine.dispatch_one())
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(order, vec!["P2", "P1", "P3"]);
    engine.assert_waiting(0);
}

#[test]
fn newest_first_dispatch_order() {
    let mut engine = TestEngine::with_params(newest_first()).with_patients(&[
        ("P1", SEVERE),
        ("P2", CRITICAL),
        ("P3", SEVERE),
    ]);
    engine.assert_order(&["P2", "P3", "P1"]);

    let first = engine.dispatch_one().unwrap();
    assert_eq!(first.id(), "P2");
    assert_eq!(first.tier(), SeverityTier::Critical);
    assert_eq!(engine.dispatch_one().unwrap().id(), "P3");
    assert_eq!(engine.dispatch_one().unwrap().id(), "P1");
}

#[test]
fn tier_dominates_arrival() {
    let mut engine = TestEngine::new().with_patients(&[
        ("mild", MILD),
        ("moderate", MODERATE),
        ("severe", SEVERE),
        ("critical", CRITICAL),
    ]);
    engine.assert_order(&["critical", "severe", "moderate", "mild"]);

    let tiers: Vec<SeverityTier> = std::iter::from_fn(|| engine.dispatch_one())
        .map(|p| p.tier())
        .collect();
    assert_eq!(
        tiers,
        vec![
            SeverityTier::Critical,
            SeverityTier::Severe,
            SeverityTier::Moderate,
            SeverityTier::Mild,
        ]
    );
}

#[test]
fn dispatch_on_empty_queue_signals_and_changes_nothing() {
    let mut engine = TestEngine::new();
    for _ in 0..3 {
        assert!(engine.dispatch_one().is_none());
        assert_eq!(engine.empty_signals(), 1);
    }
    engine.assert_waiting(0);
    assert!(engine.dispatch_log().is_empty());
    assert_eq!(engine.queue().next_sequence(), 0);
}

#[test]
fn several_dispatch_requests_in_one_frame() {
    let mut engine = TestEngine::new().with_patients(&[("a", MILD), ("b", SEVERE)]);
    for _ in 0..3 {
        engine.request_dispatch();
    }
    engine.tick(1);

    assert_eq!(engine.empty_signals(), 1);
    let ids: Vec<String> = engine
        .dispatch_log()
        .last_n(10)
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn invalid_answers_are_rejected_without_touching_the_queue() {
    let mut engine = TestEngine::new().with_patients(&[("ok", SEVERE)]);
    let before = engine.queue().next_sequence();

    engine.admit("bad", RawAnswers::new("asleep", "normal", "none", "none"));
    engine.tick(1);

    let rejections = engine.rejections();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].id, "bad");
    assert!(rejections[0].error.to_string().contains("asleep"));
    engine.assert_waiting(1);
    assert_eq!(engine.queue().next_sequence(), before);
}

#[test]
fn answers_are_case_and_whitespace_insensitive() {
    let mut engine = TestEngine::new();
    engine.admit("p", RawAnswers::new("  UNRESPONSIVE ", "Critical", "none", "NONE"));
    engine.tick(1);
    assert!(engine.rejections().is_empty());
    assert_eq!(engine.queue().peek().map(|p| p.tier()), Some(SeverityTier::Critical));
}

#[test]
fn dispatch_log_records_audit_fields() {
    let mut engine = TestEngine::new().with_patients(&[("p", CRITICAL)]);
    let dispatched = engine.dispatch_one().unwrap();
    let logged = engine.dispatch_log().latest().unwrap();
    assert_eq!(logged, &dispatched);
    assert_eq!(logged.score(), 35);
    assert_eq!(logged.sequence(), 0);
}
