//! Seams between the planner pipeline and the external services.
//!
//! The HTTP clients implement these for the real services; tests plug in
//! deterministic stubs.

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderKind, RouteCost};

/// Resolves free-text addresses to coordinates.
pub trait Geocoder {
    /// Returns `None` when the address could not be resolved, after any
    /// retries the implementation performs.
    fn geocode(&self, address: &str) -> Option<Coordinate>;
}

/// One external routing service.
///
/// A single call is a single request: retries and fallback live in
/// [`crate::route_cost::RouteCostProvider`].
pub trait RoutingProvider {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Which cache slot this provider's results are stored under.
    fn kind(&self) -> ProviderKind;

    /// Returns the normalized cost of driving `from -> to`.
    fn query(&self, from: Coordinate, to: Coordinate) -> Result<RouteCost, ProviderError>;
}

/// Anything that can price a directed pair of coordinates without failing.
pub trait RouteCostSource {
    /// Returns [`RouteCost::unreachable`] when no cost can be determined.
    fn route_cost(&mut self, from: Option<Coordinate>, to: Option<Coordinate>) -> RouteCost;
}
