//! Geographic primitives: coordinates, node identity and edge distance.

use serde::{Deserialize, Serialize};

/// Mean earth radius (IUGG) in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// How an edge weight is derived from its endpoints when the record carries
/// no explicit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Haversine distance on a spherical earth.
    GreatCircle,
    /// Equirectangular projection around the mean latitude. Cheaper, and
    /// accurate enough at city scale.
    Planar,
}

impl DistanceMetric {
    /// Distance in metres between two valid coordinates.
    pub fn distance_m(self, a: GeoPoint, b: GeoPoint) -> f64 {
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (b.lon - a.lon).to_radians();
        match self {
            DistanceMetric::GreatCircle => {
                let h = (dlat / 2.0).sin().powi(2)
                    + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
                2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
            }
            DistanceMetric::Planar => {
                let x = dlon * ((lat1 + lat2) / 2.0).cos();
                EARTH_RADIUS_M * (x * x + dlat * dlat).sqrt()
            }
        }
    }
}

/// Canonical node identity: a coordinate quantised to a fixed number of
/// decimal places. Two coordinates that round to the same grid point are the
/// same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub lat: i64,
    pub lon: i64,
}

impl NodeKey {
    /// Quantise a finite coordinate. `precision` is at most
    /// [`crate::params::MAX_COORDINATE_PRECISION`], so the product stays well
    /// inside `i64`.
    pub fn quantize(point: GeoPoint, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            lat: (point.lat * scale).round() as i64,
            lon: (point.lon * scale).round() as i64,
        }
    }

    /// The grid point this key stands for.
    pub fn to_point(self, precision: u32) -> GeoPoint {
        let scale = 10f64.powi(precision as i32);
        GeoPoint::new(self.lat as f64 / scale, self.lon as f64 / scale)
    }
}

/// Metres to the integer millimetres used as edge weights.
pub fn metres_to_mm(metres: f64) -> u64 {
    (metres * 1000.0).round().max(0.0) as u64
}

pub fn mm_to_metres(mm: u64) -> f64 {
    mm as f64 / 1000.0
}
