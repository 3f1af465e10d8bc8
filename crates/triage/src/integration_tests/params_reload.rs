//! Engine parameters: JSON loading, validation fallback and live policy changes.

use crate::classifier::{RawAnswers, SeverityTier};
use crate::params::{EngineParams, RoutingParams};
use crate::queue::TieBreakPolicy;
use crate::test_harness::TestEngine;

const SAME_TIER: [&str; 4] = ["verbal", "normal", "none", "none"];

#[test]
fn tie_break_change_reorders_waiting_patients() {
    let mut engine =
        TestEngine::new().with_patients(&[("first", SAME_TIER), ("second", SAME_TIER)]);
    engine.assert_order(&["first", "second"]);

    engine.params_mut().severity.tie_break = TieBreakPolicy::NewestFirst;
    engine.tick(1);

    assert_eq!(engine.queue().policy(), TieBreakPolicy::NewestFirst);
    engine.assert_order(&["second", "first"]);
    assert_eq!(engine.dispatch_one().unwrap().id(), "second");
}

#[test]
fn policy_change_applies_before_same_frame_admissions() {
    let mut engine = TestEngine::new().with_patients(&[("a", SAME_TIER)]);
    engine.params_mut().severity.tie_break = TieBreakPolicy::NewestFirst;
    engine.admit("b", RawAnswers::new("verbal", "normal", "none", "none"));
    engine.request_dispatch();
    engine.tick(1);

    assert_eq!(engine.dispatch_log().latest().map(|p| p.id()), Some("b"));
}

#[test]
fn json_params_drive_classification() {
    let json = r#"{
        "severity": {
            "thresholds": [1, 2, 3, 4],
            "tie_break": "NewestFirst"
        }
    }"#;
    let params = EngineParams::from_json_str(json).unwrap();
    assert_eq!(params.routing, RoutingParams::default());

    let engine = TestEngine::with_params(params).with_patients(&[("p", SAME_TIER)]);
    // verbal = 4 points, which now reaches the top threshold.
    assert_eq!(engine.queue().peek().map(|p| p.tier()), Some(SeverityTier::Critical));
    assert_eq!(engine.queue().policy(), TieBreakPolicy::NewestFirst);
}

#[test]
fn custom_labels_are_accepted_at_intake() {
    let mut params = EngineParams::default();
    params.severity.labels.consciousness = ["awake", "voice", "pain", "none"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut engine = TestEngine::with_params(params)
        .with_patients(&[("p", ["voice", "normal", "none", "none"])]);
    assert!(engine.rejections().is_empty());
    engine.assert_waiting(1);

    engine.admit("q", RawAnswers::new("verbal", "normal", "none", "none"));
    engine.tick(1);
    assert_eq!(engine.rejections().len(), 1);
}

#[test]
fn invalid_params_fall_back_to_defaults() {
    let mut params = EngineParams::default();
    params.severity.thresholds = [10, 5, 20, 35];
    assert!(params.validate().is_err());

    let engine = TestEngine::with_params(params);
    assert_eq!(engine.resource::<EngineParams>(), &EngineParams::default());
}
