//! Mock directions providers.

use std::sync::Mutex;

use route_trace::error::DirectionsError;
use route_trace::haversine::StraightLineDirections;
use route_trace::traits::{Directions, DirectionsProvider};
use route_trace::Coordinate;

/// Straight-line directions that remember every request.
#[derive(Debug, Default)]
pub struct RecordingDirections {
    inner: StraightLineDirections,
    calls: Mutex<Vec<Vec<Coordinate>>>,
}

impl RecordingDirections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Vec<Coordinate>> {
        self.calls.lock().unwrap().clone()
    }
}

impl DirectionsProvider for RecordingDirections {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        self.calls.lock().unwrap().push(coordinates.to_vec());
        self.inner.directions(coordinates)
    }
}

/// Fails every request passing through `blocked`; straight lines otherwise.
#[derive(Debug)]
pub struct FailingDirections {
    pub blocked: Coordinate,
    inner: StraightLineDirections,
}

impl FailingDirections {
    pub fn new(blocked: Coordinate) -> Self {
        Self {
            blocked,
            inner: StraightLineDirections::default(),
        }
    }
}

impl DirectionsProvider for FailingDirections {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        if coordinates.contains(&self.blocked) {
            return Err(DirectionsError::Service("Could not find routable point".to_string()));
        }
        self.inner.directions(coordinates)
    }
}
