//! Polyline representation for route geometries.
//!
//! Directions services return geometry as an encoded polyline. It is
//! decoded here, once, at the boundary; everything inside the engine works
//! on coordinate sequences.

use geo::Coord;

use crate::model::Coordinate;

/// Precision used by openrouteservice and OSRM (`geometries=polyline`).
pub const DEFAULT_PRECISION: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, String> {
        let line = ::polyline::decode_polyline(encoded, precision).map_err(|err| err.to_string())?;
        Ok(Self::new(
            line.into_iter()
                .map(|coord| Coordinate::new(coord.x, coord.y))
                .collect(),
        ))
    }

    pub fn encode(&self, precision: u32) -> Result<String, String> {
        let coords = self.points.iter().map(|point| Coord {
            x: point.lon,
            y: point.lat,
        });
        ::polyline::encode_coordinates(coords, precision).map_err(|err| err.to_string())
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
