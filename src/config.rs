// src/config.rs
use anyhow::{Context, Result, bail};
use log::info;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::models::Coordinate;

pub const APP_NAME: &str = "Aidly";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = "AI-powered emergency first aid assistance for India";

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TRANSLATION_API_URL: &str = "https://translation.googleapis.com";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "emergency_ai_vision";
pub const DEFAULT_MAPPLS_API_URL: &str = "https://apis.mappls.com";

/// IITM Janakpuri, the reference point when the user shares no location
pub const DEFAULT_REFERENCE: Coordinate = Coordinate {
    lat: 28.610532,
    lng: 77.101927,
};
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

pub const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Load the first env file found. Returns the path that was loaded.
pub fn load_env_files() -> Option<&'static str> {
    for path in ENV_PATHS.iter() {
        if Path::new(path).exists() {
            match dotenv::from_path(path) {
                Ok(()) => {
                    info!("Loaded environment variables from {}", path);
                    return Some(path);
                }
                Err(e) => info!("Failed to load environment from {}: {}", path, e),
            }
        }
    }
    info!("No .env file found, using environment variables from system");
    None
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Completion service
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub gemini_model: String,

    // Translation
    pub translation_api_key: String,
    pub translation_api_url: String,

    // Geocoding and place details
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub mappls_api_key: String,
    pub mappls_api_url: String,

    // Proximity search
    pub default_reference: Coordinate,
    pub default_radius_km: f64,
    pub facilities_path: Option<String>,

    // Server
    pub listen_addr: String,
    pub listen_port: u16,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            translation_api_key: String::new(),
            translation_api_url: DEFAULT_TRANSLATION_API_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            mappls_api_key: String::new(),
            mappls_api_url: DEFAULT_MAPPLS_API_URL.to_string(),
            default_reference: DEFAULT_REFERENCE,
            default_radius_km: DEFAULT_RADIUS_KM,
            facilities_path: None,
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8501,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let gemini_api_key = var("GEMINI_API_KEY").unwrap_or_default();
        let translation_api_key = var("TRANSLATION_API_KEY")
            .or_else(|| var("GOOGLE_TRANSLATE_API_KEY"))
            .unwrap_or_else(|| gemini_api_key.clone());

        let config = AppConfig {
            gemini_api_key,
            gemini_api_url: var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),

            translation_api_key,
            translation_api_url: var("TRANSLATION_API_URL")
                .unwrap_or(defaults.translation_api_url),

            geocoder_url: var("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocoder_user_agent: var("GEOCODER_USER_AGENT")
                .unwrap_or(defaults.geocoder_user_agent),
            mappls_api_key: var("MAPPLS_API_KEY").unwrap_or_default(),
            mappls_api_url: var("MAPPLS_API_URL").unwrap_or(defaults.mappls_api_url),

            default_reference: Coordinate::new(
                var("DEFAULT_LATITUDE")
                    .unwrap_or_else(|| DEFAULT_REFERENCE.lat.to_string())
                    .trim()
                    .parse()
                    .context("DEFAULT_LATITUDE must be a number")?,
                var("DEFAULT_LONGITUDE")
                    .unwrap_or_else(|| DEFAULT_REFERENCE.lng.to_string())
                    .trim()
                    .parse()
                    .context("DEFAULT_LONGITUDE must be a number")?,
            ),
            default_radius_km: var("DEFAULT_RADIUS_KM")
                .unwrap_or_else(|| DEFAULT_RADIUS_KM.to_string())
                .trim()
                .parse()
                .context("DEFAULT_RADIUS_KM must be a number")?,
            facilities_path: var("FACILITIES_PATH"),

            listen_addr: var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            listen_port: var("LISTEN_PORT")
                .unwrap_or_else(|| defaults.listen_port.to_string())
                .trim()
                .parse()
                .context("LISTEN_PORT must be a port number")?,
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| defaults.request_timeout_secs.to_string())
                .trim()
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_reference.is_valid() {
            bail!(
                "Default reference ({}, {}) is not a valid coordinate",
                self.default_reference.lat,
                self.default_reference.lng
            );
        }
        if !(self.default_radius_km.is_finite() && self.default_radius_km > 0.0) {
            bail!(
                "DEFAULT_RADIUS_KM must be positive, got {}",
                self.default_radius_km
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Log the effective settings. Keys are only reported as set or missing.
    pub fn log_summary(&self) {
        let state = |key: &str| if key.is_empty() { "missing" } else { "set" };

        info!("{} v{}: {}", APP_NAME, APP_VERSION, APP_DESCRIPTION);
        info!(
            "Completion: {} model {} (key {})",
            self.gemini_api_url,
            self.gemini_model,
            state(&self.gemini_api_key)
        );
        info!(
            "Translation: {} (key {})",
            self.translation_api_url,
            state(&self.translation_api_key)
        );
        info!(
            "Geocoder: {}; place details: {} (key {})",
            self.geocoder_url,
            self.mappls_api_url,
            state(&self.mappls_api_key)
        );
        info!(
            "Default reference ({:.6}, {:.6}), radius {} km, facilities from {}",
            self.default_reference.lat,
            self.default_reference.lng,
            self.default_radius_km,
            self.facilities_path.as_deref().unwrap_or("embedded table")
        );
    }
}
