//! Seams to external collaborators.
//!
//! The engine only ever asks one question of the outside world: the road
//! geometry and distances along an ordered list of coordinates.

use crate::error::DirectionsError;
use crate::model::Coordinate;
use crate::polyline::Polyline;

/// One leg between two consecutive input coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// Metres; services omit it for some zero-length legs.
    pub distance: Option<f64>,
    /// Seconds.
    pub duration: Option<f64>,
}

/// Road route through an ordered list of coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directions {
    pub geometry: Polyline,
    pub segments: Vec<Segment>,
    /// Total metres.
    pub distance: f64,
    /// Total seconds.
    pub duration: f64,
}

/// Computes road directions through an ordered coordinate list.
///
/// Implementations must be free of side effects on shared state so calls
/// can be issued concurrently.
pub trait DirectionsProvider: Send + Sync {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError>;
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for &T {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        (**self).directions(coordinates)
    }
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for Box<T> {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        (**self).directions(coordinates)
    }
}
