//! route-planner core
//!
//! Turns a depot plus delivery addresses into a priced, ordered tour:
//! geocoding, cached two-provider route costs, a pairwise cost matrix and a
//! distance-minimizing visiting order.

pub mod cache;
pub mod error;
pub mod geocode;
pub mod input;
pub mod mapquest;
pub mod matrix;
pub mod model;
pub mod osrm;
pub mod planner;
pub mod polyline;
pub mod report;
pub mod retry;
pub mod route_cost;
pub mod solver;
pub mod traits;
