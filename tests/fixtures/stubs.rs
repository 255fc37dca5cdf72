//! Deterministic stand-ins for the external services.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use route_planner::error::ProviderError;
use route_planner::model::{Coordinate, ProviderKind, RouteCost};
use route_planner::polyline::Polyline;
use route_planner::traits::{Geocoder, RoutingProvider};

use super::locations::Location;

/// Meters per degree, close enough for fixtures.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// A router that prices pairs by straight-line distance at 10 m/s and can
/// be told to fail for specific pairs.
pub struct StubRouter {
    kind: ProviderKind,
    fail_all: bool,
    failing: HashSet<(String, String)>,
    requests: Rc<Cell<usize>>,
    with_geometry: bool,
}

impl StubRouter {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            fail_all: false,
            failing: HashSet::new(),
            requests: Rc::new(Cell::new(0)),
            with_geometry: true,
        }
    }

    pub fn failing_always(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn failing_for(mut self, from: Coordinate, to: Coordinate) -> Self {
        self.failing.insert((from.key(), to.key()));
        self
    }

    pub fn without_geometry(mut self) -> Self {
        self.with_geometry = false;
        self
    }

    /// Shared request counter that stays readable after the router is moved.
    pub fn requests(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.requests)
    }

    pub fn cost(from: Coordinate, to: Coordinate) -> f64 {
        let dlat = from.lat - to.lat;
        let dlon = from.lon - to.lon;
        (dlat * dlat + dlon * dlon).sqrt() * METERS_PER_DEGREE
    }
}

impl RoutingProvider for StubRouter {
    fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Primary => "stub-primary",
            ProviderKind::Fallback => "stub-fallback",
        }
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn query(&self, from: Coordinate, to: Coordinate) -> Result<RouteCost, ProviderError> {
        self.requests.set(self.requests.get() + 1);
        if self.fail_all || self.failing.contains(&(from.key(), to.key())) {
            return Err(ProviderError::Status {
                provider: self.name(),
                status: 503,
            });
        }
        let distance = Self::cost(from, to);
        let geometry = self
            .with_geometry
            .then(|| Polyline::new(vec![from.as_tuple(), to.as_tuple()]));
        Ok(RouteCost::new(distance / 10.0, distance, geometry))
    }
}

/// Resolves addresses from a fixed table; unknown addresses fail.
pub struct StubGeocoder {
    known: HashMap<String, Coordinate>,
    requests: Cell<usize>,
}

impl StubGeocoder {
    pub fn new(locations: &[Location]) -> Self {
        Self {
            known: locations
                .iter()
                .map(|location| (location.address.to_string(), location.coordinate()))
                .collect(),
            requests: Cell::new(0),
        }
    }

    pub fn forget(mut self, address: &str) -> Self {
        self.known.remove(address);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl Geocoder for StubGeocoder {
    fn geocode(&self, address: &str) -> Option<Coordinate> {
        self.requests.set(self.requests.get() + 1);
        self.known.get(address).copied()
    }
}
