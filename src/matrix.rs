//! Pairwise cost matrix construction.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::model::Stop;
use crate::polyline::Polyline;
use crate::traits::RouteCostSource;

/// Road geometries keyed by `(from, to)` stop index. Pairs without a known
/// road path have no entry.
pub type GeometryMap = BTreeMap<(usize, usize), Polyline>;

/// Durations (seconds) and distances (meters) between every ordered pair of
/// stops. The diagonal is zero; unreachable pairs are infinite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostMatrix {
    durations: Vec<Vec<f64>>,
    distances: Vec<Vec<f64>>,
}

impl CostMatrix {
    /// Builds a matrix from square `durations` and `distances` of equal size.
    ///
    /// Returns `None` if the shapes disagree.
    pub fn new(durations: Vec<Vec<f64>>, distances: Vec<Vec<f64>>) -> Option<Self> {
        let n = distances.len();
        let square = |m: &Vec<Vec<f64>>| m.len() == n && m.iter().all(|row| row.len() == n);
        if !square(&durations) || !square(&distances) {
            return None;
        }
        Some(Self {
            durations,
            distances,
        })
    }

    /// A matrix with the given distances and zero durations.
    pub fn from_distances(distances: Vec<Vec<f64>>) -> Option<Self> {
        let durations = distances.iter().map(|row| vec![0.0; row.len()]).collect();
        Self::new(durations, distances)
    }

    fn zeroed(n: usize) -> Self {
        Self {
            durations: vec![vec![0.0; n]; n],
            distances: vec![vec![0.0; n]; n],
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations[from][to]
    }

    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    pub fn durations(&self) -> &[Vec<f64>] {
        &self.durations
    }

    /// Sums distances along consecutive indices of `order`.
    pub fn path_distance(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|leg| self.distance(leg[0], leg[1])).sum()
    }

    /// Sums durations along consecutive indices of `order`.
    pub fn path_duration(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|leg| self.duration(leg[0], leg[1])).sum()
    }

    /// Number of off-diagonal pairs with infinite distance.
    pub fn unreachable_pairs(&self) -> usize {
        self.distances
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().filter(move |(j, _)| i != *j))
            .filter(|(_, d)| !d.is_finite())
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct MatrixOptions {
    /// Pause between consecutive route lookups, to stay under provider
    /// rate limits.
    pub request_delay: Duration,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    options: MatrixOptions,
}

impl MatrixBuilder {
    pub fn new(options: MatrixOptions) -> Self {
        Self { options }
    }

    /// Prices every ordered pair `(i, j)`, `i != j`, exactly once.
    pub fn build<S: RouteCostSource + ?Sized>(&self, source: &mut S, stops: &[Stop]) -> (CostMatrix, GeometryMap) {
        let n = stops.len();
        let mut matrix = CostMatrix::zeroed(n);
        let mut geometries = GeometryMap::new();
        let mut first = true;

        for (i, from) in stops.iter().enumerate() {
            for (j, to) in stops.iter().enumerate() {
                if i == j {
                    continue;
                }
                if !first && !self.options.request_delay.is_zero() {
                    thread::sleep(self.options.request_delay);
                }
                first = false;

                let cost = source.route_cost(from.coordinate, to.coordinate);
                matrix.durations[i][j] = cost.duration_seconds;
                matrix.distances[i][j] = cost.distance_meters;
                if let Some(geometry) = cost.geometry {
                    geometries.insert((i, j), geometry);
                }
            }
            debug!(row = i + 1, rows = n, stop = %from.label, "priced matrix row");
        }

        info!(
            stops = n,
            pairs = n * n.saturating_sub(1),
            with_geometry = geometries.len(),
            unreachable = matrix.unreachable_pairs(),
            "cost matrix built"
        );

        (matrix, geometries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, RouteCost};

    /// Prices pairs by index distance and records every call.
    struct Recording {
        calls: Vec<(Coordinate, Coordinate)>,
    }

    impl RouteCostSource for Recording {
        fn route_cost(&mut self, from: Option<Coordinate>, to: Option<Coordinate>) -> RouteCost {
            let (from, to) = (from.expect("from"), to.expect("to"));
            self.calls.push((from, to));
            let distance = (from.lat - to.lat).abs() * 1_000.0;
            let geometry = (from.lat < to.lat).then(|| Polyline::new(vec![from.as_tuple(), to.as_tuple()]));
            RouteCost::new(distance / 10.0, distance, geometry)
        }
    }

    fn stops(n: usize) -> Vec<Stop> {
        (0..n)
            .map(|i| Stop::new(format!("S{i}"), format!("{i} Main St")).with_coordinate(Coordinate::new(i as f64, 0.0)))
            .collect()
    }

    fn builder() -> MatrixBuilder {
        MatrixBuilder::new(MatrixOptions {
            request_delay: Duration::ZERO,
        })
    }

    #[test]
    fn queries_each_ordered_pair_once() {
        let mut source = Recording { calls: Vec::new() };
        builder().build(&mut source, &stops(4));

        assert_eq!(source.calls.len(), 12);
        let mut seen: Vec<(String, String)> = source.calls.iter().map(|(a, b)| (a.key(), b.key())).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn fills_matrix_and_sparse_geometry() {
        let mut source = Recording { calls: Vec::new() };
        let (matrix, geometries) = builder().build(&mut source, &stops(3));

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.distance(0, 2), 2_000.0);
        assert_eq!(matrix.duration(2, 1), 100.0);
        for i in 0..3 {
            assert_eq!(matrix.distance(i, i), 0.0);
        }
        // only "uphill" pairs carry geometry in this fixture
        assert_eq!(geometries.keys().copied().collect::<Vec<_>>(), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn path_sums_follow_order() {
        let matrix = CostMatrix::new(
            vec![vec![0.0, 5.0], vec![7.0, 0.0]],
            vec![vec![0.0, 50.0], vec![70.0, 0.0]],
        )
        .expect("square");
        assert_eq!(matrix.path_distance(&[0, 1, 0]), 120.0);
        assert_eq!(matrix.path_duration(&[0, 1, 0]), 12.0);
    }

    #[test]
    fn rejects_ragged_input() {
        assert!(CostMatrix::from_distances(vec![vec![0.0, 1.0], vec![1.0]]).is_none());
        assert!(CostMatrix::new(vec![vec![0.0]], vec![vec![0.0, 1.0], vec![1.0, 0.0]]).is_none());
    }

    #[test]
    fn counts_unreachable_pairs() {
        let matrix = CostMatrix::from_distances(vec![
            vec![0.0, f64::INFINITY],
            vec![3.0, 0.0],
        ])
        .expect("square");
        assert_eq!(matrix.unreachable_pairs(), 1);
    }
}
