//! Transport graph built from origin/destination records.
//!
//! Nodes are quantised coordinates ([`NodeKey`]), kept sorted so lookups are
//! a binary search. Adjacency is stored in Compressed Sparse Row form: the
//! out-edges of node `i` are `edges[node_offsets[i]..node_offsets[i + 1]]`,
//! with matching `weights` in integer millimetres. Parallel edges keep their
//! own slots; nothing is collapsed.
//!
//! The graph is built once and never mutated. Rebuilding means discarding it
//! and calling [`TransportGraph::build`] again.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geo::{metres_to_mm, GeoPoint, NodeKey};
use crate::params::{RoutingParams, MAX_COORDINATE_PRECISION};

/// Longest single edge accepted, in metres. Neither metric can produce a
/// distance this large between valid coordinates.
pub const MAX_EDGE_COST_M: f64 = 1.0e8;

/// Node indices and CSR offsets are `u32`, and each edge can introduce two
/// nodes, so no graph holds more edges than this whatever `max_edges` says.
pub const MAX_GRAPH_EDGES: usize = (u32::MAX / 2) as usize;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One row of transport data: an origin, a destination and, when the map
/// source knows it, the road cost between them in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportRecord {
    pub origin_lat: Option<f64>,
    pub origin_lon: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lon: Option<f64>,
    pub cost_m: Option<f64>,
}

impl TransportRecord {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin_lat: Some(origin.lat),
            origin_lon: Some(origin.lon),
            dest_lat: Some(destination.lat),
            dest_lon: Some(destination.lon),
            cost_m: None,
        }
    }

    /// Attach an explicit road cost, overriding the configured metric.
    pub fn with_cost(mut self, cost_m: f64) -> Self {
        self.cost_m = Some(cost_m);
        self
    }

    /// Build a record from text cells. Blank or non-numeric cells become
    /// missing coordinates and are rejected at build time.
    pub fn from_text(origin_lat: &str, origin_lon: &str, dest_lat: &str, dest_lon: &str) -> Self {
        fn cell(text: &str) -> Option<f64> {
            text.trim().parse::<f64>().ok()
        }
        Self {
            origin_lat: cell(origin_lat),
            origin_lon: cell(origin_lon),
            dest_lat: cell(dest_lat),
            dest_lon: cell(dest_lon),
            cost_m: None,
        }
    }

    fn coordinate(&self, field: CoordField) -> Result<f64, RecordDefect> {
        let value = match field {
            CoordField::OriginLat => self.origin_lat,
            CoordField::OriginLon => self.origin_lon,
            CoordField::DestLat => self.dest_lat,
            CoordField::DestLon => self.dest_lon,
        }
        .ok_or(RecordDefect::MissingCoordinate(field))?;

        if !value.is_finite() {
            return Err(RecordDefect::NonFinite(field));
        }
        if field.is_latitude() {
            if !(-90.0..=90.0).contains(&value) {
                return Err(RecordDefect::LatitudeOutOfRange(field));
            }
        } else if !(-180.0..=180.0).contains(&value) {
            return Err(RecordDefect::LongitudeOutOfRange(field));
        }
        Ok(value)
    }

    /// Check every field; returns the endpoints and the validated cost.
    pub fn validate(&self) -> Result<(GeoPoint, GeoPoint, Option<f64>), RecordDefect> {
        let origin = GeoPoint::new(
            self.coordinate(CoordField::OriginLat)?,
            self.coordinate(CoordField::OriginLon)?,
        );
        let destination = GeoPoint::new(
            self.coordinate(CoordField::DestLat)?,
            self.coordinate(CoordField::DestLon)?,
        );
        if let Some(cost) = self.cost_m {
            if !(0.0..=MAX_EDGE_COST_M).contains(&cost) {
                return Err(RecordDefect::InvalidCost);
            }
        }
        Ok((origin, destination, self.cost_m))
    }
}

/// The four coordinate cells of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordField {
    OriginLat,
    OriginLon,
    DestLat,
    DestLon,
}

impl CoordField {
    pub fn is_latitude(self) -> bool {
        matches!(self, CoordField::OriginLat | CoordField::DestLat)
    }
}

impl fmt::Display for CoordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordField::OriginLat => "origin latitude",
            CoordField::OriginLon => "origin longitude",
            CoordField::DestLat => "destination latitude",
            CoordField::DestLon => "destination longitude",
        };
        f.write_str(name)
    }
}

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordDefect {
    MissingCoordinate(CoordField),
    NonFinite(CoordField),
    LatitudeOutOfRange(CoordField),
    LongitudeOutOfRange(CoordField),
    /// Cost was negative, not finite or above [`MAX_EDGE_COST_M`].
    InvalidCost,
    /// Storing the record would exceed `RoutingParams::max_edges`, or push
    /// the total edge weight past `u64`.
    CapacityExceeded,
}

impl fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDefect::MissingCoordinate(field) => write!(f, "{field} is missing"),
            RecordDefect::NonFinite(field) => write!(f, "{field} is not finite"),
            RecordDefect::LatitudeOutOfRange(field) => {
                write!(f, "{field} is outside [-90, 90]")
            }
            RecordDefect::LongitudeOutOfRange(field) => {
                write!(f, "{field} is outside [-180, 180]")
            }
            RecordDefect::InvalidCost => {
                write!(f, "cost must be finite and within [0, {MAX_EDGE_COST_M}] m")
            }
            RecordDefect::CapacityExceeded => write!(f, "graph edge capacity exceeded"),
        }
    }
}

/// Whether a record yields one edge or a pair of opposite edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphDirection {
    Directed,
    Undirected,
}

// ---------------------------------------------------------------------------
// Build report
// ---------------------------------------------------------------------------

/// What happened during a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub records_seen: usize,
    pub records_accepted: usize,
    pub edges_added: usize,
    /// One `EngineError::InvalidRecord` per skipped record, in input order.
    pub dropped: Vec<EngineError>,
}

impl BuildReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Running sum of accepted edge weights. A shortest path never costs more
/// than every edge in the graph together, so while this sum fits in `u64`
/// no route search can overflow.
#[derive(Debug, Default)]
struct WeightBudget {
    used_mm: u64,
}

impl WeightBudget {
    fn try_reserve(&mut self, mm: u64) -> bool {
        match self.used_mm.checked_add(mm) {
            Some(total) => {
                self.used_mm = total;
                true
            }
            None => false,
        }
    }
}

fn edge_capacity(params: &RoutingParams) -> usize {
    params
        .max_edges
        .map_or(MAX_GRAPH_EDGES, |cap| cap.min(MAX_GRAPH_EDGES))
}

fn drop_record(report: &mut BuildReport, index: usize, defect: RecordDefect) {
    warn!("Transport record #{index} dropped: {defect}");
    report.dropped.push(EngineError::InvalidRecord { index, defect });
}

/// A freshly built graph together with its report.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: TransportGraph,
    pub report: BuildReport,
}

// ---------------------------------------------------------------------------
// TransportGraph
// ---------------------------------------------------------------------------

/// Immutable CSR road graph shared read-only by every router.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportGraph {
    /// Decimal places used to quantise coordinates into nodes.
    precision: u32,
    /// Sorted node identities.
    nodes: Vec<NodeKey>,
    /// `node_offsets[i]..node_offsets[i + 1]` spans node i's out-edges.
    node_offsets: Vec<u32>,
    /// Edge targets (indices into `nodes`).
    edges: Vec<u32>,
    /// Edge weights in millimetres, parallel to `edges`.
    weights: Vec<u64>,
}

impl Default for TransportGraph {
    fn default() -> Self {
        Self::empty(RoutingParams::default().coordinate_precision)
    }
}

impl TransportGraph {
    /// A graph with no nodes.
    pub fn empty(precision: u32) -> Self {
        Self {
            precision,
            nodes: Vec::new(),
            node_offsets: vec![0],
            edges: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Build from records. Malformed records are skipped and reported; the
    /// build always completes with the valid subset.
    ///
    /// A precision above [`MAX_COORDINATE_PRECISION`] is clamped to it.
    pub fn build<I>(records: I, params: &RoutingParams) -> GraphBuild
    where
        I: IntoIterator<Item = TransportRecord>,
    {
        let precision = params.coordinate_precision.min(MAX_COORDINATE_PRECISION);
        if precision != params.coordinate_precision {
            warn!(
                "Coordinate precision {} clamped to {precision}",
                params.coordinate_precision
            );
        }
        let cap = edge_capacity(params);
        let mut budget = WeightBudget::default();
        let mut report = BuildReport::default();
        // (from, to, weight) in input order.
        let mut raw_edges: Vec<(NodeKey, NodeKey, u64)> = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            report.records_seen += 1;

            let (origin, destination, cost) = match record.validate() {
                Ok(parts) => parts,
                Err(defect) => {
                    drop_record(&mut report, index, defect);
                    continue;
                }
            };

            let from = NodeKey::quantize(origin, precision);
            let to = NodeKey::quantize(destination, precision);
            let paired = params.direction == GraphDirection::Undirected && from != to;
            let needed: u64 = if paired { 2 } else { 1 };

            if raw_edges.len() + needed as usize > cap {
                drop_record(&mut report, index, RecordDefect::CapacityExceeded);
                continue;
            }

            let metres = cost.unwrap_or_else(|| params.metric.distance_m(origin, destination));
            if metres > MAX_EDGE_COST_M {
                drop_record(&mut report, index, RecordDefect::InvalidCost);
                continue;
            }
            let weight = metres_to_mm(metres);
            // weight <= 1e11 mm, so the product cannot overflow.
            if !budget.try_reserve(weight * needed) {
                drop_record(&mut report, index, RecordDefect::CapacityExceeded);
                continue;
            }
            raw_edges.push((from, to, weight));
            if paired {
                raw_edges.push((to, from, weight));
            }
            report.records_accepted += 1;
        }

        let graph = Self::from_edges(precision, &raw_edges);
        report.edges_added = graph.edge_count();

        info!(
            "Transport graph built: {} nodes, {} edges from {} records ({} dropped)",
            graph.node_count(),
            graph.edge_count(),
            report.records_seen,
            report.dropped_count()
        );

        GraphBuild { graph, report }
    }

    /// Lay validated edges out in CSR form. Each node's out-edges keep their
    /// input order.
    ///
    /// `raw_edges` holds at most [`MAX_GRAPH_EDGES`] entries, so node
    /// indices and running offsets fit in `u32`.
    fn from_edges(precision: u32, raw_edges: &[(NodeKey, NodeKey, u64)]) -> Self {
        let mut nodes: Vec<NodeKey> = raw_edges
            .iter()
            .flat_map(|&(from, to, _)| [from, to])
            .collect();
        nodes.sort_unstable();
        nodes.dedup();

        let index_of = |key: &NodeKey| {
            nodes
                .binary_search(key)
                .ok()
                .and_then(|i| u32::try_from(i).ok())
        };

        let mut resolved: Vec<(u32, u32, u64)> = Vec::with_capacity(raw_edges.len());
        for (from, to, weight) in raw_edges {
            // Both endpoints were inserted above.
            if let (Some(u), Some(v)) = (index_of(from), index_of(to)) {
                resolved.push((u, v, *weight));
            }
        }

        let mut degree = vec![0u32; nodes.len()];
        for &(u, _, _) in &resolved {
            degree[u as usize] += 1;
        }

        let mut node_offsets = Vec::with_capacity(nodes.len() + 1);
        let mut running = 0u32;
        node_offsets.push(running);
        for d in &degree {
            running += d;
            node_offsets.push(running);
        }

        let mut cursor: Vec<u32> = node_offsets[..nodes.len()].to_vec();
        let mut edges = vec![0u32; resolved.len()];
        let mut weights = vec![0u64; resolved.len()];
        for &(u, v, w) in &resolved {
            let slot = cursor[u as usize] as usize;
            edges[slot] = v;
            weights[slot] = w;
            cursor[u as usize] += 1;
        }

        Self {
            precision,
            nodes,
            node_offsets,
            edges,
            weights,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sorted node identities.
    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    /// Index of the node `point` quantises to, if it exists.
    pub fn find_node(&self, point: GeoPoint) -> Option<u32> {
        if !point.lat.is_finite() || !point.lon.is_finite() {
            return None;
        }
        let key = NodeKey::quantize(point, self.precision);
        self.nodes.binary_search(&key).ok().map(|i| i as u32)
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        self.find_node(point).is_some()
    }

    /// Canonical coordinate of node `idx`.
    pub fn node_point(&self, idx: u32) -> Option<GeoPoint> {
        self.nodes
            .get(idx as usize)
            .map(|key| key.to_point(self.precision))
    }

    fn edge_range(&self, idx: u32) -> std::ops::Range<usize> {
        let i = idx as usize;
        match (self.node_offsets.get(i), self.node_offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => start as usize..end as usize,
            _ => 0..0,
        }
    }

    /// Out-degree of node `idx`, counting parallel edges.
    pub fn out_degree(&self, idx: u32) -> usize {
        self.edge_range(idx).len()
    }

    /// Every out-edge of node `idx` as `(target, weight_mm)`, parallel edges
    /// included. Unknown indices have no edges.
    pub fn neighbor_weights(&self, idx: u32) -> impl Iterator<Item = (u32, u64)> + '_ {
        let range = self.edge_range(idx);
        self.edges[range.clone()]
            .iter()
            .zip(self.weights[range].iter())
            .map(|(&e, &w)| (e, w))
    }
}
