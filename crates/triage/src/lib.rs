//! Emergency triage and routing engine.
//!
//! Incoming patients answer a short questionnaire, are scored into a
//! [`SeverityTier`], and wait in a [`TriageQueue`] ordered by tier, then by
//! arrival. A [`TransportGraph`] built from origin/destination records lets
//! the [`Router`] find the cheapest route for the dispatched ambulance.
//!
//! Everything here is usable as plain values; [`TriageEnginePlugin`] wires the
//! same pieces into a Bevy app as resources, events and systems.

pub mod classifier;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod graph;
pub mod intake;
pub mod params;
pub mod plugin;
pub mod queue;
pub mod route_service;
pub mod router;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use classifier::{classify, Classification, Questionnaire, RawAnswers, SeverityTier};
pub use error::EngineError;
pub use geo::{DistanceMetric, GeoPoint};
pub use graph::{BuildReport, GraphBuild, GraphDirection, TransportGraph, TransportRecord};
pub use params::{EngineParams, RoutingParams, SeverityParams};
pub use plugin::{TriageEnginePlugin, TriageSet};
pub use queue::{Patient, QueueRow, SharedTriageQueue, TieBreakPolicy, TriageQueue};
pub use router::{shortest_path, RouteResult, Router};
