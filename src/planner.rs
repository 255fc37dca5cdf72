//! End-to-end planning: addresses in, ordered tour out.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::PlannerError;
use crate::matrix::{CostMatrix, GeometryMap, MatrixBuilder, MatrixOptions};
use crate::model::Stop;
use crate::solver::{OptimizeOptions, Tour, optimize};
use crate::traits::{Geocoder, RouteCostSource};

/// One line of input: a label and a free-text address. The first entry is
/// the depot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub label: String,
    pub address: String,
}

impl AddressEntry {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Pause between geocoding requests.
    pub geocode_delay: Duration,
    pub matrix: MatrixOptions,
    pub optimize: OptimizeOptions,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            geocode_delay: Duration::from_millis(500),
            matrix: MatrixOptions::default(),
            optimize: OptimizeOptions::default(),
        }
    }
}

impl PlannerOptions {
    /// No pauses between requests; for cached or stubbed runs.
    pub fn without_delays() -> Self {
        Self {
            geocode_delay: Duration::ZERO,
            matrix: MatrixOptions {
                request_delay: Duration::ZERO,
            },
            optimize: OptimizeOptions::default(),
        }
    }
}

/// A geocoded stop that made it into the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    /// Position in the input list.
    pub input_index: usize,
    pub stop: Stop,
}

/// Everything the renderer needs. Matrix and geometry indices refer to
/// positions in `stops`; the depot is index 0.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub stops: Vec<PlannedStop>,
    /// Inputs dropped because they could not be geocoded.
    pub skipped: Vec<PlannedStop>,
    pub matrix: CostMatrix,
    pub geometries: GeometryMap,
    pub tour: Tour,
}

impl RoutePlan {
    /// Stops in visiting order, depot first and last.
    pub fn ordered_stops(&self) -> impl Iterator<Item = &PlannedStop> + '_ {
        self.tour.order.iter().map(|&i| &self.stops[i])
    }
}

/// Rejects inputs that cannot form a tour, before any network call.
pub fn validate(entries: &[AddressEntry]) -> Result<(), PlannerError> {
    match entries.len() {
        0 => Err(PlannerError::EmptyInput),
        1 => Err(PlannerError::TooFewAddresses(1)),
        _ => Ok(()),
    }
}

/// Geocodes every entry in order, one request at a time.
pub fn geocode_stops<G: Geocoder + ?Sized>(
    geocoder: &G,
    entries: &[AddressEntry],
    delay: Duration,
) -> Vec<Stop> {
    let mut stops = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        let mut stop = Stop::new(&entry.label, &entry.address);
        stop.coordinate = geocoder.geocode(&entry.address);
        stops.push(stop);
    }
    stops
}

/// Splits stops into those with coordinates (renumbered contiguously) and
/// those without. The depot must survive.
fn partition(stops: Vec<Stop>) -> Result<(Vec<PlannedStop>, Vec<PlannedStop>), PlannerError> {
    let total = stops.len();
    let (valid, skipped): (Vec<PlannedStop>, Vec<PlannedStop>) = stops
        .into_iter()
        .enumerate()
        .map(|(input_index, stop)| PlannedStop { input_index, stop })
        .partition(|planned| planned.stop.coordinate.is_some());

    if let Some(depot) = skipped.iter().find(|planned| planned.input_index == 0) {
        return Err(PlannerError::DepotUnresolved {
            address: depot.stop.address.clone(),
        });
    }
    if !skipped.is_empty() {
        warn!(
            skipped = skipped.len(),
            labels = ?skipped.iter().map(|p| p.stop.label.as_str()).collect::<Vec<_>>(),
            "addresses could not be geocoded and will be skipped"
        );
    }
    if valid.len() < 2 {
        return Err(PlannerError::InsufficientStops {
            valid: valid.len(),
            total,
        });
    }
    Ok((valid, skipped))
}

/// Runs the whole pipeline: validate, geocode, filter, price, optimize.
pub fn plan<G, S>(
    entries: &[AddressEntry],
    geocoder: &G,
    costs: &mut S,
    options: &PlannerOptions,
) -> Result<RoutePlan, PlannerError>
where
    G: Geocoder + ?Sized,
    S: RouteCostSource + ?Sized,
{
    validate(entries)?;

    info!(addresses = entries.len(), "geocoding addresses");
    let geocoded = geocode_stops(geocoder, entries, options.geocode_delay);
    let (stops, skipped) = partition(geocoded)?;

    info!(stops = stops.len(), "building cost matrix");
    let plain: Vec<Stop> = stops.iter().map(|planned| planned.stop.clone()).collect();
    let (matrix, geometries) = MatrixBuilder::new(options.matrix.clone()).build(costs, &plain);

    let tour = optimize(&matrix, 0, &options.optimize);
    if !tour.is_complete() {
        warn!("best tour crosses an unreachable pair; total distance is infinite");
    }

    Ok(RoutePlan {
        stops,
        skipped,
        matrix,
        geometries,
        tour,
    })
}
