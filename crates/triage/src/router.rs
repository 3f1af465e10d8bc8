//! Shortest-path routing over a [`TransportGraph`].
//!
//! Dijkstra on node indices with integer millimetre costs, so totals are
//! exact and repeatable. The router only borrows the graph; nothing survives
//! between calls.

use bevy::prelude::*;
use pathfinding::prelude::{build_path, dijkstra, dijkstra_all};
use serde::{Deserialize, Serialize};

use crate::geo::{mm_to_metres, GeoPoint, NodeKey};
use crate::graph::TransportGraph;

/// Outcome of a route query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Node coordinates from source to destination inclusive. Empty when
    /// source and destination are the same node, or when no route exists.
    pub path: Vec<GeoPoint>,
    /// Total distance in metres.
    pub distance_m: f64,
    /// Total distance in millimetres; the exact value the search minimised.
    pub cost_mm: u64,
    pub found: bool,
}

impl RouteResult {
    /// No route: an endpoint is not in the graph, or the endpoints lie in
    /// different components.
    pub fn not_found() -> Self {
        Self {
            path: Vec::new(),
            distance_m: 0.0,
            cost_mm: 0,
            found: false,
        }
    }

    /// Source and destination coincide.
    pub fn identity() -> Self {
        Self {
            found: true,
            ..Self::not_found()
        }
    }

    /// Number of edges travelled.
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Read-only router over a borrowed graph.
#[derive(Debug, Clone, Copy)]
pub struct Router<'g> {
    graph: &'g TransportGraph,
}

impl<'g> Router<'g> {
    pub fn new(graph: &'g TransportGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g TransportGraph {
        self.graph
    }

    /// Do both points quantise to the same node identity?
    fn same_node(&self, a: GeoPoint, b: GeoPoint) -> bool {
        let finite = |p: GeoPoint| p.lat.is_finite() && p.lon.is_finite();
        let precision = self.graph.precision();
        finite(a) && finite(b) && NodeKey::quantize(a, precision) == NodeKey::quantize(b, precision)
    }

    fn route_from(&self, indices: Vec<u32>, cost_mm: u64) -> RouteResult {
        RouteResult {
            path: indices
                .into_iter()
                .filter_map(|idx| self.graph.node_point(idx))
                .collect(),
            distance_m: mm_to_metres(cost_mm),
            cost_mm,
            found: true,
        }
    }

    /// Cheapest route from `source` to `destination`.
    ///
    /// - same node: found, empty path, zero cost;
    /// - an endpoint outside the graph, or no connecting path: not found.
    pub fn shortest_path(&self, source: GeoPoint, destination: GeoPoint) -> RouteResult {
        if self.same_node(source, destination) {
            return RouteResult::identity();
        }

        let (Some(start), Some(goal)) = (
            self.graph.find_node(source),
            self.graph.find_node(destination),
        ) else {
            debug!("No route {source:?} -> {destination:?}: endpoint not in graph");
            return RouteResult::not_found();
        };

        match dijkstra(
            &start,
            |&idx| self.graph.neighbor_weights(idx),
            |&idx| idx == goal,
        ) {
            Some((indices, cost)) => {
                let route = self.route_from(indices, cost);
                debug!(
                    "Route {source:?} -> {destination:?}: {} hops, {:.1} m",
                    route.hop_count(),
                    route.distance_m
                );
                route
            }
            None => {
                debug!("No route {source:?} -> {destination:?}: disconnected");
                RouteResult::not_found()
            }
        }
    }

    /// Distance in metres to every node reachable from `source`, the source
    /// itself included, closest first. Equal distances keep node order.
    pub fn distances_from(&self, source: GeoPoint) -> Vec<(GeoPoint, f64)> {
        let Some(start) = self.graph.find_node(source) else {
            return Vec::new();
        };
        let reached = dijkstra_all(&start, |&idx| self.graph.neighbor_weights(idx));

        let mut costs: Vec<(u64, u32)> = reached
            .iter()
            .map(|(&idx, &(_, cost))| (cost, idx))
            .collect();
        costs.push((0, start));
        costs.sort_unstable();

        costs
            .into_iter()
            .filter_map(|(cost, idx)| {
                self.graph
                    .node_point(idx)
                    .map(|point| (point, mm_to_metres(cost)))
            })
            .collect()
    }

    /// The reachable candidate closest to `source`, with its route. Ties go to
    /// the lowest candidate index. `None` when no candidate can be reached.
    pub fn nearest(&self, source: GeoPoint, candidates: &[GeoPoint]) -> Option<(usize, RouteResult)> {
        if let Some(i) = candidates.iter().position(|&c| self.same_node(source, c)) {
            return Some((i, RouteResult::identity()));
        }

        let start = self.graph.find_node(source)?;
        let reached = dijkstra_all(&start, |&idx| self.graph.neighbor_weights(idx));

        let mut best: Option<(u64, usize, u32)> = None;
        for (i, &candidate) in candidates.iter().enumerate() {
            let Some(idx) = self.graph.find_node(candidate) else {
                continue;
            };
            let Some(&(_, cost)) = reached.get(&idx) else {
                continue;
            };
            if best.map_or(true, |(best_cost, _, _)| cost < best_cost) {
                best = Some((cost, i, idx));
            }
        }

        let (cost, i, idx) = best?;
        Some((i, self.route_from(build_path(&idx, &reached), cost)))
    }
}

/// Convenience wrapper around [`Router::shortest_path`].
pub fn shortest_path(
    graph: &TransportGraph,
    source: GeoPoint,
    destination: GeoPoint,
) -> RouteResult {
    Router::new(graph).shortest_path(source, destination)
}
