//! Plugin that wires the engine into a Bevy app: resources, events and the
//! intake → dispatch → routing systems.

use bevy::prelude::*;

use crate::dispatch::{dispatch_patients, DispatchLog, DispatchNext, PatientDispatched, QueueEmpty};
use crate::graph::TransportGraph;
use crate::intake::{admit_patients, sync_tie_break_policy, AdmissionRejected, AdmitPatient};
use crate::params::EngineParams;
use crate::queue::TriageQueue;
use crate::route_service::{
    rebuild_transport_graph, resolve_routes, LastBuildReport, LoadTransportRecords, RouteLog,
    RouteRequest, RouteResolved, TransportGraphLoaded,
};

/// Ordered phases for the engine's `Update` systems.
///
/// Configured as a chain: `Intake` → `Dispatch` → `Routing`, so a patient
/// admitted in a frame can be dispatched in the same frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TriageSet {
    /// Policy sync and admission.
    Intake,
    /// Extraction of the most urgent patient.
    Dispatch,
    /// Graph rebuilds, then route queries.
    Routing,
}

/// Registers the triage queue, transport graph, logs, events and systems.
#[derive(Debug, Clone, Default)]
pub struct TriageEnginePlugin {
    params: EngineParams,
}

impl TriageEnginePlugin {
    pub fn with_params(params: EngineParams) -> Self {
        Self { params }
    }
}

impl Plugin for TriageEnginePlugin {
    fn build(&self, app: &mut App) {
        let params = match self.params.validate() {
            Ok(()) => self.params.clone(),
            Err(err) => {
                warn!("{err}; falling back to default engine parameters");
                EngineParams::default()
            }
        };

        app.insert_resource(TriageQueue::new(params.severity.tie_break));
        app.insert_resource(TransportGraph::empty(params.routing.coordinate_precision));
        app.insert_resource(params);
        app.init_resource::<DispatchLog>();
        app.init_resource::<RouteLog>();
        app.init_resource::<LastBuildReport>();

        app.add_event::<AdmitPatient>()
            .add_event::<AdmissionRejected>()
            .add_event::<DispatchNext>()
            .add_event::<PatientDispatched>()
            .add_event::<QueueEmpty>()
            .add_event::<LoadTransportRecords>()
            .add_event::<TransportGraphLoaded>()
            .add_event::<RouteRequest>()
            .add_event::<RouteResolved>();

        app.configure_sets(
            Update,
            (TriageSet::Intake, TriageSet::Dispatch, TriageSet::Routing).chain(),
        );

        app.add_systems(
            Update,
            (
                (sync_tie_break_policy, admit_patients)
                    .chain()
                    .in_set(TriageSet::Intake),
                dispatch_patients.in_set(TriageSet::Dispatch),
                (rebuild_transport_graph, resolve_routes)
                    .chain()
                    .in_set(TriageSet::Routing),
            ),
        );
    }
}
