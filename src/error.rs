//! Error and diagnostic types.
//!
//! Fatal conditions are `Result` errors; everything the engine can recover
//! from is reported as a [`Diagnostic`] next to the feature graph.

use thiserror::Error;

/// The action-log document could not be read at all.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read action log: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse action log: {0}")]
    Json(#[from] serde_json::Error),
}

/// A vehicle's log violates the structure the compiler relies on.
///
/// Fatal for that vehicle only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLogError {
    #[error("minute key '{0}' is not a non-negative integer")]
    InvalidMinute(String),
    #[error("{action} at minute {minute} is missing '{field}'")]
    MissingField {
        minute: u32,
        action: String,
        field: &'static str,
    },
    #[error("{action} at minute {minute} has an unusable '{field}'")]
    InvalidField {
        minute: u32,
        action: String,
        field: &'static str,
    },
    #[error("node {node} referenced at minute {minute} does not exist")]
    UnknownNode { node: u32, minute: u32 },
    #[error("no travelling action places the vehicle at minute {minute}")]
    NoPosition { minute: u32 },
}

/// The directions service failed or returned nothing usable.
#[derive(Debug, Error)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions service rejected the request: {0}")]
    Service(String),
    #[error("directions service returned no route")]
    NoRoute,
    #[error("invalid route geometry: {0}")]
    Geometry(String),
    #[error("at least two coordinates are required, got {0}")]
    TooFewCoordinates(usize),
}

/// The history of a parcel could not be traced back to its pickup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("origin of parcel {parcel} not found from route {route_number}; kept {kept} waypoint(s)")]
pub struct UnresolvedOriginWarning {
    pub parcel: u32,
    pub route_number: usize,
    pub kept: usize,
}

/// Non-fatal findings collected while reconstructing the feature graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("route {route_number}: skipped unrecognized action '{action_type}' at minute {minute}")]
    UnrecognizedAction {
        route_number: usize,
        minute: u32,
        action_type: String,
    },
    #[error(transparent)]
    UnresolvedOrigin(#[from] UnresolvedOriginWarning),
    #[error("route {route_number}: parcel {parcel} has no known request, delivery path left empty")]
    UnknownRequest { parcel: u32, route_number: usize },
    #[error("route {route_number} skipped: {error}")]
    VehicleSkipped {
        route_number: usize,
        error: MalformedLogError,
    },
    #[error("route {route_number}: road geometry unavailable: {reason}")]
    RouteUnavailable { route_number: usize, reason: String },
    #[error("delivery of parcel {parcel} on route {route_number}: single route unavailable: {reason}")]
    SingleRouteUnavailable {
        parcel: u32,
        route_number: usize,
        reason: String,
    },
}
