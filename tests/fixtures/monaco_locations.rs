//! Real Monaco locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.
//! These are routable locations that work with the OSRM Monaco extract.

use route_trace::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lng, self.lat)
    }
}

pub const PRINCES_PALACE: Location = Location::new("Prince's Palace", 43.7314, 7.4198);
pub const CASINO: Location = Location::new("Casino de Monte-Carlo", 43.7394, 7.4283);
pub const PORT_HERCULE: Location = Location::new("Port Hercule", 43.7351, 7.4223);
pub const STADE_LOUIS_II: Location = Location::new("Stade Louis II", 43.7277, 7.4155);
pub const LARVOTTO: Location = Location::new("Larvotto Beach", 43.7445, 7.4347);
pub const MONACO_STATION: Location = Location::new("Gare de Monaco", 43.7390, 7.4203);
pub const OCEANOGRAPHIC_MUSEUM: Location = Location::new("Musée océanographique", 43.7308, 7.4253);

/// Fixture node `id` sits at `LOCATIONS[id - 1]`.
pub const LOCATIONS: &[Location] = &[
    PRINCES_PALACE,
    CASINO,
    PORT_HERCULE,
    STADE_LOUIS_II,
    LARVOTTO,
    MONACO_STATION,
    OCEANOGRAPHIC_MUSEUM,
];

/// Location of node `id` (1-based) in [`LOCATIONS`].
pub fn node_location(id: u32) -> Coordinate {
    LOCATIONS[id as usize - 1].coordinate()
}
