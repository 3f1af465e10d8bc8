//! Transport graph loading and route requests inside the app.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::geo::GeoPoint;
use crate::graph::{BuildReport, TransportGraph, TransportRecord};
use crate::params::EngineParams;
use crate::router::{RouteResult, Router};

/// Maximum number of answered requests retained in [`RouteLog`].
const MAX_ENTRIES: usize = 64;

/// Replace the transport graph with one built from `records`.
#[derive(Event, Debug, Clone, Default)]
pub struct LoadTransportRecords {
    pub records: Vec<TransportRecord>,
}

/// Sent after every rebuild with what the build accepted and dropped.
#[derive(Event, Debug, Clone)]
pub struct TransportGraphLoaded {
    pub report: BuildReport,
}

/// Report of the most recent graph rebuild. Empty until the first load.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct LastBuildReport(pub BuildReport);

#[derive(Event, Debug, Clone, Copy)]
pub struct RouteRequest {
    pub request_id: u64,
    pub source: GeoPoint,
    pub destination: GeoPoint,
}

#[derive(Event, Debug, Clone)]
pub struct RouteResolved {
    pub request_id: u64,
    pub result: RouteResult,
}

/// Ring buffer of the last [`MAX_ENTRIES`] answered route requests.
#[derive(Resource, Debug, Clone, Default)]
pub struct RouteLog {
    entries: VecDeque<(u64, RouteResult)>,
}

impl RouteLog {
    pub fn push(&mut self, request_id: u64, result: RouteResult) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back((request_id, result));
    }

    /// Most recent answer for `request_id`, if still retained.
    pub fn get(&self, request_id: u64) -> Option<&RouteResult> {
        self.entries
            .iter()
            .rev()
            .find(|(id, _)| *id == request_id)
            .map(|(_, result)| result)
    }

    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &(u64, RouteResult)> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The only place the graph resource is replaced. When several loads arrive
/// in one frame the last one wins.
pub fn rebuild_transport_graph(
    mut loads: EventReader<LoadTransportRecords>,
    params: Res<EngineParams>,
    mut graph: ResMut<TransportGraph>,
    mut last_report: ResMut<LastBuildReport>,
    mut loaded: EventWriter<TransportGraphLoaded>,
) {
    let Some(load) = loads.read().last() else {
        return;
    };
    let build = TransportGraph::build(load.records.iter().copied(), &params.routing);
    *graph = build.graph;
    last_report.0 = build.report.clone();
    loaded.send(TransportGraphLoaded {
        report: build.report,
    });
}

pub fn resolve_routes(
    mut requests: EventReader<RouteRequest>,
    graph: Res<TransportGraph>,
    mut log: ResMut<RouteLog>,
    mut resolved: EventWriter<RouteResolved>,
) {
    let router = Router::new(&graph);
    for request in requests.read() {
        let result = router.shortest_path(request.source, request.destination);
        log.push(request.request_id, result.clone());
        resolved.send(RouteResolved {
            request_id: request.request_id,
            result,
        });
    }
}
