//! Straight-line directions provider (fallback when no routing service is available).
//!
//! Uses great-circle distance between consecutive coordinates.
//! Less accurate than a road router (ignores roads) but always available.

use crate::error::DirectionsError;
use crate::model::Coordinate;
use crate::polyline::Polyline;
use crate::traits::{Directions, DirectionsProvider, Segment};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based directions provider.
///
/// Returns the input coordinates as the route geometry, with great-circle
/// leg distances in metres and durations from an assumed speed.
#[derive(Debug, Clone)]
pub struct StraightLineDirections {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for StraightLineDirections {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl StraightLineDirections {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lon - from.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(&self, km: f64) -> f64 {
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round()
    }
}

impl DirectionsProvider for StraightLineDirections {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        if coordinates.len() < 2 {
            return Err(DirectionsError::TooFewCoordinates(coordinates.len()));
        }

        let segments: Vec<Segment> = coordinates
            .windows(2)
            .map(|leg| {
                let km = Self::haversine_km(leg[0], leg[1]);
                Segment {
                    distance: Some(km * 1000.0),
                    duration: Some(self.km_to_seconds(km)),
                }
            })
            .collect();

        Ok(Directions {
            geometry: Polyline::new(coordinates.to_vec()),
            distance: segments.iter().filter_map(|s| s.distance).sum(),
            duration: segments.iter().filter_map(|s| s.duration).sum(),
            segments,
        })
    }
}
