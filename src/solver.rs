//! Tour optimizer: exact search for small stop sets, nearest neighbour
//! (optionally polished by 2-opt) otherwise.
//!
//! The objective is total distance only. Duration is summed along the
//! chosen order afterwards.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::matrix::CostMatrix;

/// Largest stop count (depot included) solved by exhaustive search.
pub const DEFAULT_EXACT_SEARCH_LIMIT: usize = 8;

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Stop counts up to this (depot included) are solved exactly.
    pub exact_search_limit: usize,
    /// 2-opt passes applied to heuristic tours. Zero keeps the plain
    /// nearest-neighbour order.
    pub two_opt_passes: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            exact_search_limit: DEFAULT_EXACT_SEARCH_LIMIT,
            two_opt_passes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStrategy {
    Exact,
    NearestNeighbor,
    NearestNeighborTwoOpt,
}

/// A closed visiting order starting and ending at the depot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    pub order: Vec<usize>,
    /// Infinite when the order has to cross an unreachable pair.
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    pub strategy: TourStrategy,
}

impl Tour {
    pub fn is_complete(&self) -> bool {
        self.total_distance_meters.is_finite()
    }
}

/// Picks a visiting order over every index of `matrix`.
///
/// Exact search keeps the first minimum in lexicographic permutation order;
/// nearest neighbour breaks distance ties by the lowest stop index.
///
/// An empty matrix, or a `depot` outside it, yields an empty tour with
/// zero totals.
pub fn optimize(matrix: &CostMatrix, depot: usize, options: &OptimizeOptions) -> Tour {
    let n = matrix.len();
    if depot >= n {
        warn!(depot, stops = n, "depot is not a matrix index; nothing to visit");
        return Tour {
            order: Vec::new(),
            total_distance_meters: 0.0,
            total_duration_seconds: 0.0,
            strategy: TourStrategy::Exact,
        };
    }

    let (order, strategy) = if n <= options.exact_search_limit {
        (exact_order(matrix, depot), TourStrategy::Exact)
    } else {
        let mut order = nearest_neighbor_order(matrix, depot);
        if options.two_opt_passes > 0 {
            two_opt(matrix, &mut order, options.two_opt_passes);
            (order, TourStrategy::NearestNeighborTwoOpt)
        } else {
            (order, TourStrategy::NearestNeighbor)
        }
    };

    let tour = Tour {
        total_distance_meters: matrix.path_distance(&order),
        total_duration_seconds: matrix.path_duration(&order),
        order,
        strategy,
    };
    info!(
        stops = n,
        strategy = ?tour.strategy,
        distance_m = tour.total_distance_meters,
        duration_s = tour.total_duration_seconds,
        "tour optimized"
    );
    tour
}

fn closed(depot: usize, inner: &[usize]) -> Vec<usize> {
    let mut order = Vec::with_capacity(inner.len() + 2);
    order.push(depot);
    order.extend_from_slice(inner);
    order.push(depot);
    order
}

/// Exhaustive search over all permutations of the non-depot stops.
fn exact_order(matrix: &CostMatrix, depot: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..matrix.len()).filter(|&i| i != depot).collect();
    let mut best = closed(depot, &perm);
    let mut best_distance = matrix.path_distance(&best);
    let mut examined = 1usize;

    while next_permutation(&mut perm) {
        examined += 1;
        let candidate = closed(depot, &perm);
        let distance = matrix.path_distance(&candidate);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }

    debug!(examined, best_distance, "exact search finished");
    best
}

/// Advances `items` to the next lexicographic permutation. Returns false,
/// leaving `items` untouched, when it is already the last one.
fn next_permutation(items: &mut [usize]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(successor) = items.iter().rposition(|&x| x > items[pivot]) else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

/// Greedy tour: always drive to the closest stop not yet visited.
fn nearest_neighbor_order(matrix: &CostMatrix, depot: usize) -> Vec<usize> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    visited[depot] = true;
    let mut order = Vec::with_capacity(n + 1);
    order.push(depot);
    let mut current = depot;

    for _ in 1..n {
        let mut next: Option<(usize, f64)> = None;
        for candidate in (0..n).filter(|&i| !visited[i]) {
            let distance = matrix.distance(current, candidate);
            if next.is_none_or(|(_, best)| distance < best) {
                next = Some((candidate, distance));
            }
        }
        let Some((stop, _)) = next else { break };
        visited[stop] = true;
        order.push(stop);
        current = stop;
    }

    order.push(depot);
    order
}

/// Segment reversal: reverse `order[i..=j]` when it lowers total distance.
///
/// Works on the full path cost, so asymmetric matrices are handled
/// correctly. Each pass applies the first improving move found.
fn two_opt(matrix: &CostMatrix, order: &mut [usize], passes: usize) {
    if order.len() < 5 {
        return;
    }
    let last = order.len() - 2;

    for pass in 0..passes {
        let current = matrix.path_distance(order);
        let mut improved = false;

        'search: for i in 1..last {
            for j in i + 1..=last {
                order[i..=j].reverse();
                if matrix.path_distance(order) < current {
                    improved = true;
                    break 'search;
                }
                order[i..=j].reverse();
            }
        }

        if !improved {
            debug!(pass, "2-opt converged");
            break;
        }
    }
}
