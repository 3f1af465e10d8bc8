//! End-to-end: admit a patient, dispatch them, route an ambulance.

use crate::classifier::{RawAnswers, SeverityTier};
use crate::geo::GeoPoint;
use crate::graph::TransportRecord;
use crate::router::Router;
use crate::test_harness::TestEngine;

const DEPOT: GeoPoint = GeoPoint::new(37.5000, 127.0000);
const CROSSING: GeoPoint = GeoPoint::new(37.5050, 127.0000);
const NORTH_ER: GeoPoint = GeoPoint::new(37.5100, 127.0000);
const EAST_ER: GeoPoint = GeoPoint::new(37.5050, 127.0200);

fn district() -> Vec<TransportRecord> {
    vec![
        TransportRecord::new(DEPOT, CROSSING),
        TransportRecord::new(CROSSING, NORTH_ER),
        TransportRecord::new(CROSSING, EAST_ER),
    ]
}

#[test]
fn admit_dispatch_route_in_one_frame() {
    let mut engine = TestEngine::new().with_records(district());

    engine.admit("walk-in", RawAnswers::new("alert", "normal", "mild", "none"));
    engine.admit("collapse", RawAnswers::new("unresponsive", "laboured", "none", "minor"));
    engine.request_dispatch();
    engine.request_route(1, DEPOT, NORTH_ER);
    engine.tick(1);

    // Intake runs before dispatch, so the urgent arrival goes first.
    let dispatched = engine.dispatch_log().latest().unwrap();
    assert_eq!(dispatched.id(), "collapse");
    assert_eq!(dispatched.tier(), SeverityTier::Urgent);
    engine.assert_order(&["walk-in"]);

    let route = engine.route_log().get(1).unwrap();
    assert!(route.found);
    assert_eq!(route.hop_count(), 2);
}

#[test]
fn dispatched_patient_goes_to_nearest_emergency_room() {
    let mut engine = TestEngine::new()
        .with_records(district())
        .with_patients(&[("p1", ["pain", "critical", "severe", "major"])]);

    let patient = engine.dispatch_one().unwrap();
    assert_eq!(patient.tier(), SeverityTier::Critical);

    let router = Router::new(engine.graph());
    let (index, route) = router.nearest(DEPOT, &[EAST_ER, NORTH_ER]).unwrap();
    assert_eq!(index, 1, "north ER is about 1.1 km away, east ER about 2.3 km");
    assert_eq!(route.path.first(), Some(&DEPOT));
    assert_eq!(route.path.last(), Some(&NORTH_ER));
}

#[test]
fn queue_survives_graph_reloads() {
    let mut engine = TestEngine::new().with_patients(&[
        ("a", ["verbal", "normal", "none", "none"]),
        ("b", ["verbal", "normal", "none", "none"]),
    ]);
    engine.load_records(district());
    engine.tick(1);
    engine.load_records(Vec::new());
    engine.tick(1);

    assert!(engine.graph().is_empty());
    engine.assert_order(&["a", "b"]);
}
