//! Value types shared by the geocoding, routing and optimization layers.

use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Fixed-precision key used to address cached costs.
    ///
    /// Six decimal places is roughly 0.1 m, so two coordinates that differ
    /// below that share a key.
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lon)
    }

    /// Returns the coordinate as a `(lat, lon)` tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// A location to visit: the depot (index 0) or a delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub label: String,
    pub address: String,
    /// Filled by geocoding; stays `None` if the address could not be resolved.
    pub coordinate: Option<Coordinate>,
}

impl Stop {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
            coordinate: None,
        }
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }
}

/// Which routing service produced a cached cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Primary,
    Fallback,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Primary => "primary",
            ProviderKind::Fallback => "fallback",
        }
    }
}

/// Travel cost between two coordinates, normalized to seconds and meters.
///
/// `geometry` is `None` for a degraded edge whose cost is known but whose
/// road path is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCost {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub geometry: Option<Polyline>,
}

impl RouteCost {
    pub fn new(duration_seconds: f64, distance_meters: f64, geometry: Option<Polyline>) -> Self {
        Self {
            duration_seconds,
            distance_meters,
            geometry,
        }
    }

    /// The failure sentinel: infinite cost, no geometry.
    pub fn unreachable() -> Self {
        Self {
            duration_seconds: f64::INFINITY,
            distance_meters: f64::INFINITY,
            geometry: None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.distance_meters.is_finite() && self.duration_seconds.is_finite()
    }
}

/// A successful provider response as stored in the cost cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub geometry: Option<Polyline>,
    pub provider: ProviderKind,
}

impl CostEntry {
    pub fn from_route(cost: RouteCost, provider: ProviderKind) -> Self {
        Self {
            duration_seconds: cost.duration_seconds,
            distance_meters: cost.distance_meters,
            geometry: cost.geometry,
            provider,
        }
    }

    pub fn to_route_cost(&self) -> RouteCost {
        RouteCost {
            duration_seconds: self.duration_seconds,
            distance_meters: self.distance_meters,
            geometry: self.geometry.clone(),
        }
    }
}
