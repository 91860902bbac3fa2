//! Test fixtures for route-trace.
//!
//! Provides realistic test data including:
//! - Real Monaco locations (from OpenStreetMap)
//! - Builders for action logs
//! - Mock directions providers
//! - OSRM dataset preparation for the container tests

#![allow(dead_code)]

pub mod log_builder;
pub mod monaco_locations;
pub mod osrm_data;
pub mod providers;

pub use log_builder::*;
pub use monaco_locations::*;
pub use providers::*;
