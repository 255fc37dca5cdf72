//! JSON route report handed to the map renderer.
//!
//! Non-finite costs serialize as `null`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::PlannerError;
use crate::model::Coordinate;
use crate::planner::RoutePlan;
use crate::solver::TourStrategy;

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub strategy: TourStrategy,
    pub totals: Totals,
    pub stops: Vec<ReportStop>,
    pub legs: Vec<Leg>,
    pub skipped: Vec<SkippedStop>,
    pub distances_meters: Vec<Vec<f64>>,
    pub durations_seconds: Vec<Vec<f64>>,
    /// Every known road path, keyed `"i,j"` by stop index.
    pub geometries: Vec<KeyedGeometry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub distance_km: f64,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStop {
    /// Position in the tour; the depot appears at both ends.
    pub order: usize,
    /// Index into the matrices.
    pub index: usize,
    pub input_index: usize,
    pub label: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    pub depot: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leg {
    pub from: usize,
    pub to: usize,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// False when only a straight line can be drawn.
    pub road_path: bool,
    pub geometry: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedStop {
    pub input_index: usize,
    pub label: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyedGeometry {
    pub key: String,
    pub points: Vec<(f64, f64)>,
}

impl RouteReport {
    pub fn from_plan(plan: &RoutePlan) -> Self {
        let tour = &plan.tour;
        let depot = tour.order.first().copied().unwrap_or_default();

        let stops = tour
            .order
            .iter()
            .enumerate()
            .map(|(order, &index)| {
                let planned = &plan.stops[index];
                ReportStop {
                    order,
                    index,
                    input_index: planned.input_index,
                    label: planned.stop.label.clone(),
                    address: planned.stop.address.clone(),
                    coordinate: planned.stop.coordinate,
                    depot: index == depot,
                }
            })
            .collect();

        let legs = tour
            .order
            .windows(2)
            .map(|pair| {
                let (from, to) = (pair[0], pair[1]);
                let geometry = plan.geometries.get(&(from, to));
                Leg {
                    from,
                    to,
                    distance_meters: plan.matrix.distance(from, to),
                    duration_seconds: plan.matrix.duration(from, to),
                    road_path: geometry.is_some(),
                    geometry: geometry.map(|g| g.points().to_vec()),
                }
            })
            .collect();

        let skipped = plan
            .skipped
            .iter()
            .map(|planned| SkippedStop {
                input_index: planned.input_index,
                label: planned.stop.label.clone(),
                address: planned.stop.address.clone(),
            })
            .collect();

        let geometries = plan
            .geometries
            .iter()
            .map(|(&(i, j), polyline)| KeyedGeometry {
                key: format!("{i},{j}"),
                points: polyline.points().to_vec(),
            })
            .collect();

        Self {
            strategy: tour.strategy,
            totals: Totals {
                distance_meters: tour.total_distance_meters,
                duration_seconds: tour.total_duration_seconds,
                distance_km: tour.total_distance_meters / 1000.0,
                duration_hours: tour.total_duration_seconds / 3600.0,
            },
            stops,
            legs,
            skipped,
            distances_meters: plan.matrix.distances().to_vec(),
            durations_seconds: plan.matrix.durations().to_vec(),
            geometries,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), PlannerError> {
        let io_err = |source| PlannerError::Report {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}
