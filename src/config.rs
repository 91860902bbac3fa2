//! Directions backend configuration.
//!
//! Settings come from the environment, after loading a `.env` file if one
//! is present:
//!
//! | Variable                  | Default                            |
//! |---------------------------|------------------------------------|
//! | `DIRECTIONS_BACKEND`      | `ors`                              |
//! | `ORS_URL`                 | `https://api.openrouteservice.org` |
//! | `ORS_API_KEY`             | none                               |
//! | `OSRM_URL`                | `http://localhost:5000`            |
//! | `DIRECTIONS_PROFILE`      | backend specific                   |
//! | `DIRECTIONS_TIMEOUT_SECS` | `10`                               |
//!
//! A non-empty `ORS_URL` points at a self-hosted instance, which needs no
//! API key. The public endpoint does.

use std::str::FromStr;

use thiserror::Error;

use crate::haversine::StraightLineDirections;
use crate::ors::{OrsClient, OrsConfig, PUBLIC_URL};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::traits::DirectionsProvider;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown directions backend '{0}' (expected ors, osrm or straight)")]
    UnknownBackend(String),
    #[error("DIRECTIONS_TIMEOUT_SECS must be a whole number of seconds, got '{0}'")]
    InvalidTimeout(String),
    #[error("ORS_API_KEY is required when ORS_URL is not set")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionsBackend {
    #[default]
    Ors,
    Osrm,
    StraightLine,
}

impl FromStr for DirectionsBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ors" | "openrouteservice" => Ok(Self::Ors),
            "osrm" => Ok(Self::Osrm),
            "straight" | "haversine" => Ok(Self::StraightLine),
            _ => Err(ConfigError::UnknownBackend(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsSettings {
    pub backend: DirectionsBackend,
    pub ors_url: Option<String>,
    pub ors_api_key: Option<String>,
    pub osrm_url: Option<String>,
    pub profile: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DirectionsSettings {
    fn default() -> Self {
        Self {
            backend: DirectionsBackend::default(),
            ors_url: None,
            ors_api_key: None,
            osrm_url: None,
            profile: None,
            timeout_secs: 10,
        }
    }
}

impl DirectionsSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("DIRECTIONS_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };
        let timeout_secs = match get("DIRECTIONS_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(value))?,
            None => defaults.timeout_secs,
        };

        Ok(Self {
            backend,
            ors_url: get("ORS_URL"),
            ors_api_key: get("ORS_API_KEY"),
            osrm_url: get("OSRM_URL"),
            profile: get("DIRECTIONS_PROFILE"),
            timeout_secs,
        })
    }

    pub fn ors_config(&self) -> Result<OrsConfig, ConfigError> {
        if self.ors_url.is_none() && self.ors_api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        let defaults = OrsConfig::default();
        Ok(OrsConfig {
            base_url: self.ors_url.clone().unwrap_or_else(|| PUBLIC_URL.to_string()),
            api_key: self.ors_api_key.clone(),
            profile: self.profile.clone().unwrap_or(defaults.profile),
            timeout_secs: self.timeout_secs,
        })
    }

    pub fn osrm_config(&self) -> OsrmConfig {
        let defaults = OsrmConfig::default();
        OsrmConfig {
            base_url: self.osrm_url.clone().unwrap_or(defaults.base_url),
            profile: self.profile.clone().unwrap_or(defaults.profile),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn build_provider(&self) -> Result<Box<dyn DirectionsProvider>, ConfigError> {
        let provider: Box<dyn DirectionsProvider> = match self.backend {
            DirectionsBackend::Ors => Box::new(OrsClient::new(self.ors_config()?)?),
            DirectionsBackend::Osrm => Box::new(OsrmClient::new(self.osrm_config())?),
            DirectionsBackend::StraightLine => Box::new(StraightLineDirections::default()),
        };
        Ok(provider)
    }
}
