//! route-trace core
//!
//! Rebuilds a map feature graph (routes, stops, handovers, per-parcel
//! delivery paths) from a simulation's per-vehicle action log.

pub mod assembler;
pub mod compiler;
pub mod config;
pub mod enrich;
pub mod error;
pub mod feature;
pub mod haversine;
pub mod keys;
pub mod model;
pub mod normalize;
pub mod ors;
pub mod osrm;
pub mod polyline;
pub mod traits;
pub mod waypoints;

pub use assembler::{TraceOptions, TraceOutput, reconstruct};
pub use model::{ActionLog, Coordinate};
pub use traits::DirectionsProvider;
