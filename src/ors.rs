//! openrouteservice HTTP adapter for road directions.

use serde::Deserialize;
use serde_json::json;

use crate::error::DirectionsError;
use crate::model::Coordinate;
use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::traits::{Directions, DirectionsProvider, Segment};

/// Public openrouteservice endpoint; requires an API key.
pub const PUBLIC_URL: &str = "https://api.openrouteservice.org";

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    /// Sent as the `Authorization` header. Self-hosted instances run without one.
    pub api_key: Option<String>,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: PUBLIC_URL.to_string(),
            api_key: None,
            profile: "driving-car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/v2/directions/{}/json",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }
}

impl DirectionsProvider for OrsClient {
    fn directions(&self, coordinates: &[Coordinate]) -> Result<Directions, DirectionsError> {
        if coordinates.len() < 2 {
            return Err(DirectionsError::TooFewCoordinates(coordinates.len()));
        }

        let body = json!({
            "coordinates": coordinates.iter().map(|c| [c.lon, c.lat]).collect::<Vec<_>>(),
        });

        let mut request = self.client.post(self.url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response = request.send()?;
        let status = response.status();
        let body: OrsResponse = response.json()?;
        if let Some(error) = body.error {
            return Err(DirectionsError::Service(error.message));
        }
        if !status.is_success() {
            return Err(DirectionsError::Service(status.to_string()));
        }

        body.into_directions()
    }
}

#[derive(Debug, Deserialize)]
struct OrsResponse {
    #[serde(default)]
    routes: Vec<OrsRoute>,
    error: Option<OrsError>,
}

#[derive(Debug, Deserialize)]
struct OrsError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrsRoute {
    geometry: String,
    #[serde(default)]
    segments: Vec<OrsSegment>,
    #[serde(default)]
    summary: OrsSummary,
}

#[derive(Debug, Default, Deserialize)]
struct OrsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

/// ORS leaves `distance` out of zero-length segments.
#[derive(Debug, Deserialize)]
struct OrsSegment {
    distance: Option<f64>,
    duration: Option<f64>,
}

impl OrsResponse {
    fn into_directions(self) -> Result<Directions, DirectionsError> {
        let route = self.routes.into_iter().next().ok_or(DirectionsError::NoRoute)?;
        let geometry =
            Polyline::decode(&route.geometry, DEFAULT_PRECISION).map_err(DirectionsError::Geometry)?;

        Ok(Directions {
            geometry,
            segments: route
                .segments
                .into_iter()
                .map(|segment| Segment {
                    distance: segment.distance,
                    duration: segment.duration,
                })
                .collect(),
            distance: route.summary.distance,
            duration: route.summary.duration,
        })
    }
}
