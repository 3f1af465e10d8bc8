//! # TestEngine: headless harness for the triage engine
//!
//! Wraps `bevy::app::App` + `MinimalPlugins` + [`TriageEnginePlugin`] so tests
//! can send events, run frames and inspect resources without a window.

use bevy::app::App;
use bevy::ecs::event::Events;
use bevy::prelude::*;

use crate::classifier::RawAnswers;
use crate::dispatch::{DispatchLog, DispatchNext, PatientDispatched, QueueEmpty};
use crate::geo::GeoPoint;
use crate::graph::{BuildReport, TransportGraph, TransportRecord};
use crate::intake::{AdmissionRejected, AdmitPatient};
use crate::params::EngineParams;
use crate::plugin::TriageEnginePlugin;
use crate::queue::{Patient, TriageQueue};
use crate::route_service::{
    LastBuildReport, LoadTransportRecords, RouteLog, RouteRequest, RouteResolved,
};
use crate::router::RouteResult;

/// A headless Bevy App running the engine plugin.
pub struct TestEngine {
    app: App,
    next_request_id: u64,
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Engine with default parameters and an empty transport graph.
    pub fn new() -> Self {
        Self::with_params(EngineParams::default())
    }

    pub fn with_params(params: EngineParams) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(TriageEnginePlugin::with_params(params));
        app.update();
        Self {
            app,
            next_request_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Builder helpers (consume and return Self)
    // -----------------------------------------------------------------------

    /// Load transport records and run a frame so the graph is in place.
    pub fn with_records(mut self, records: Vec<TransportRecord>) -> Self {
        self.load_records(records);
        self.tick(1);
        self
    }

    /// Admit patients given as `(id, [consciousness, breathing, bleeding, trauma])`
    /// and run a frame.
    pub fn with_patients(mut self, patients: &[(&str, [&str; 4])]) -> Self {
        for (id, [c, br, bl, t]) in patients {
            self.admit(*id, RawAnswers::new(*c, *br, *bl, *t));
        }
        self.tick(1);
        self
    }

    // -----------------------------------------------------------------------
    // Event senders (take effect on the next tick)
    // -----------------------------------------------------------------------

    pub fn admit(&mut self, id: impl Into<String>, answers: RawAnswers) {
        self.app.world_mut().send_event(AdmitPatient {
            id: id.into(),
            answers,
        });
    }

    pub fn request_dispatch(&mut self) {
        self.app.world_mut().send_event(DispatchNext);
    }

    pub fn load_records(&mut self, records: Vec<TransportRecord>) {
        self.app
            .world_mut()
            .send_event(LoadTransportRecords { records });
    }

    pub fn request_route(&mut self, request_id: u64, source: GeoPoint, destination: GeoPoint) {
        self.app.world_mut().send_event(RouteRequest {
            request_id,
            source,
            destination,
        });
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `n` frames.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Request one dispatch, run a frame, and return who left the queue.
    pub fn dispatch_one(&mut self) -> Option<Patient> {
        self.request_dispatch();
        self.tick(1);
        self.drain_events::<PatientDispatched>()
            .pop()
            .map(|e| e.patient)
    }

    /// Request one route, run a frame, and return the answer.
    pub fn route(&mut self, source: GeoPoint, destination: GeoPoint) -> Option<RouteResult> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.request_route(request_id, source, destination);
        self.tick(1);
        self.drain_events::<RouteResolved>()
            .into_iter()
            .find(|e| e.request_id == request_id)
            .map(|e| e.result)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    /// Get a reference to any resource.
    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn queue(&self) -> &TriageQueue {
        self.resource::<TriageQueue>()
    }

    pub fn graph(&self) -> &TransportGraph {
        self.resource::<TransportGraph>()
    }

    /// Report of the latest graph load.
    pub fn build_report(&self) -> &BuildReport {
        &self.resource::<LastBuildReport>().0
    }

    pub fn dispatch_log(&self) -> &DispatchLog {
        self.resource::<DispatchLog>()
    }

    pub fn route_log(&self) -> &RouteLog {
        self.resource::<RouteLog>()
    }

    pub fn params_mut(&mut self) -> Mut<'_, EngineParams> {
        self.app.world_mut().resource_mut::<EngineParams>()
    }

    /// Take every pending event of type `E` out of the world.
    pub fn drain_events<E: Event>(&mut self) -> Vec<E> {
        self.app
            .world_mut()
            .resource_mut::<Events<E>>()
            .drain()
            .collect()
    }

    pub fn rejections(&mut self) -> Vec<AdmissionRejected> {
        self.drain_events::<AdmissionRejected>()
    }

    pub fn empty_signals(&mut self) -> usize {
        self.drain_events::<QueueEmpty>().len()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_waiting(&self, expected: usize) {
        let actual = self.queue().len();
        assert_eq!(actual, expected, "Expected {expected} waiting patients, got {actual}");
    }

    /// Assert the queue's current order by patient id.
    pub fn assert_order(&self, expected: &[&str]) {
        let actual: Vec<String> = self
            .queue()
            .snapshot_rows()
            .into_iter()
            .map(|row| row.patient_id)
            .collect();
        assert_eq!(actual, expected, "Unexpected queue order");
    }
}
