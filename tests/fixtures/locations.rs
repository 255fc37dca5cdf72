//! Real locations for realistic fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use route_planner::model::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub address: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, address: &'static str, lat: f64, lon: f64) -> Self {
        Self {
            name,
            address,
            lat,
            lon,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Depot first, then delivery stops around Makati and Pasig.
pub const MANILA: &[Location] = &[
    Location::new("Warehouse", "2258 Chino Roces Ave, Makati", 14.5396, 121.0164),
    Location::new("Stop1", "Greenbelt 3, Ayala Center, Makati", 14.5526, 121.0214),
    Location::new("Stop2", "SM Megamall, Mandaluyong", 14.5849, 121.0566),
    Location::new("Stop3", "Bonifacio High Street, Taguig", 14.5509, 121.0509),
    Location::new("Stop4", "Rockwell Center, Makati", 14.5650, 121.0365),
    Location::new("Stop5", "Ortigas Center, Pasig", 14.5869, 121.0614),
];

/// Routable points inside the OSRM Nevada extract.
pub const LAS_VEGAS: &[Location] = &[
    Location::new("Bellagio", "3600 S Las Vegas Blvd", 36.1126, -115.1767),
    Location::new("Caesars Palace", "3570 S Las Vegas Blvd", 36.1162, -115.1745),
    Location::new("Wynn Las Vegas", "3131 S Las Vegas Blvd", 36.1263781, -115.1658180),
];
