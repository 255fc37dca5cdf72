//! Test fixtures for route-planner.
//!
//! Provides:
//! - Real Metro Manila and Las Vegas locations
//! - Scriptable geocoding and routing stubs that count their requests

#![allow(dead_code)]

pub mod locations;
pub mod stubs;

pub use locations::*;
pub use stubs::*;
