//! OSRM HTTP adapter for road directions.

use serde::Deserialize;

use crate::error::DirectionsError;
use crate::model::Coordinate;
use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::traits::{Directions, DirectionsProvider, Segment};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, coordinates: &[Coordinate]) -> String {
        let coords = coordinates
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl DirectionsProvider for OsrmClient {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        if coordinates.len() < 2 {
            return Err(DirectionsError::TooFewCoordinates(coordinates.len()));
        }

        // OSRM reports failures such as `NoRoute` in the body of a 400 response.
        let body: OsrmRouteResponse = self.client.get(self.url(coordinates)).send()?.json()?;
        body.into_directions()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: Option<f64>,
    duration: Option<f64>,
}

impl OsrmRouteResponse {
    fn into_directions(self) -> Result<Directions, DirectionsError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" => return Err(DirectionsError::NoRoute),
            _ => {
                let message = self.message.unwrap_or_default();
                return Err(DirectionsError::Service(format!("{}: {}", self.code, message)));
            }
        }

        let route = self.routes.into_iter().next().ok_or(DirectionsError::NoRoute)?;
        let geometry =
            Polyline::decode(&route.geometry, DEFAULT_PRECISION).map_err(DirectionsError::Geometry)?;

        Ok(Directions {
            geometry,
            segments: route
                .legs
                .into_iter()
                .map(|leg| Segment {
                    distance: leg.distance,
                    duration: leg.duration,
                })
                .collect(),
            distance: route.distance,
            duration: route.duration,
        })
    }
}
