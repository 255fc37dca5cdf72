//! Polyline representation for route geometries.
//!
//! Routing services ship road paths in compact forms: OSRM uses the encoded
//! polyline algorithm, MapQuest a flat `[lat, lng, lat, lng, ...]` array.
//! Both are decoded here, at the boundary, into plain `(lat, lon)` points.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinate precision used by OSRM's `geometries=polyline` output.
pub const POLYLINE_PRECISION: u32 = 5;

/// Errors raised while decoding an encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid polyline character {byte:#04x} at position {position}")]
    InvalidByte { byte: u8, position: usize },
    #[error("polyline ends mid-value at position {position}")]
    Truncated { position: usize },
    #[error("polyline value starting before position {position} overflows")]
    Overflow { position: usize },
}

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    ///
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string with the given precision.
    ///
    /// An empty string decodes to an empty polyline.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut position = 0;
        let mut lat: i64 = 0;
        let mut lon: i64 = 0;
        let mut points = Vec::new();

        while position < bytes.len() {
            let overflow = PolylineError::Overflow { position };
            lat = lat
                .checked_add(next_delta(bytes, &mut position)?)
                .ok_or(overflow.clone())?;
            lon = lon
                .checked_add(next_delta(bytes, &mut position)?)
                .ok_or(overflow)?;
            points.push((lat as f64 / factor, lon as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Pairs up a flat alternating `[lat1, lon1, lat2, lon2, ...]` array.
    ///
    /// A trailing unpaired value is ignored.
    pub fn from_flat(values: &[f64]) -> Self {
        let points = values
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A path needs at least two points to be drawn as a road.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}

/// Reads one zig-zag encoded, 5-bit chunked value starting at `position`.
fn next_delta(bytes: &[u8], position: &mut usize) -> Result<i64, PolylineError> {
    let start = *position;
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes
            .get(*position)
            .ok_or(PolylineError::Truncated { position: *position })?;
        if !(63..127).contains(&byte) {
            return Err(PolylineError::InvalidByte {
                byte,
                position: *position,
            });
        }
        *position += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
        if shift > 60 {
            return Err(PolylineError::Overflow { position: start });
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}
