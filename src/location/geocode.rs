// src/location/geocode.rs
//
// Address lookup against a Nominatim-compatible search endpoint

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use crate::models::Coordinate;
use crate::services::error::{ApiError, read_json};
use crate::services::{endpoint, http_client};

/// Nominatim's usage policy allows one request per second
pub const GEOCODE_MIN_DELAY: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the address is empty or nothing matched
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ApiError>;
}

/// Searches are scoped to India unless the address already names it.
pub fn search_query(address: &str) -> String {
    if address.to_lowercase().contains("india") {
        address.to_string()
    } else {
        format!("{}, India", address)
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl SearchHit {
    fn coordinate(&self) -> Result<Coordinate, ApiError> {
        let lat = self
            .lat
            .trim()
            .parse::<f64>()
            .map_err(|e| ApiError::parse(format!("latitude '{}': {}", self.lat, e)))?;
        let lng = self
            .lon
            .trim()
            .parse::<f64>()
            .map_err(|e| ApiError::parse(format!("longitude '{}': {}", self.lon, e)))?;

        let coordinate = Coordinate::new(lat, lng);
        if !coordinate.is_valid() {
            return Err(ApiError::parse(format!(
                "coordinate ({}, {}) is out of range",
                lat, lng
            )));
        }
        Ok(coordinate)
    }
}

#[derive(Clone)]
pub struct GeocodingClient {
    http_client: reqwest::Client,
    search_endpoint: String,
    user_agent: String,
    min_delay: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl GeocodingClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            search_endpoint: endpoint(base_url, "search"),
            user_agent: user_agent.to_string(),
            min_delay: GEOCODE_MIN_DELAY,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Wait until `min_delay` has passed since the previous request started.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                debug!("Geocoder rate limit: waiting {:.2?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let query = search_query(address);
        let url = Url::parse_with_params(
            &self.search_endpoint,
            &[("q", query.as_str()), ("format", "json"), ("limit", "1")],
        )?;

        self.throttle().await;
        debug!("Geocoding '{}'", query);

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;
        let hits: Vec<SearchHit> = read_json(response).await?;

        match hits.first() {
            Some(hit) => hit.coordinate().map(Some),
            None => {
                info!("Could not find location: {}", address);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_appends_india() {
        assert_eq!(search_query("Janakpuri, Delhi"), "Janakpuri, Delhi, India");
        assert_eq!(search_query("Connaught Place, New Delhi, India"), "Connaught Place, New Delhi, India");
        assert_eq!(search_query("MUMBAI INDIA"), "MUMBAI INDIA");
    }

    #[test]
    fn test_search_hit_parses_string_coordinates() {
        let hits: Vec<SearchHit> = serde_json::from_str(
            r#"[{"place_id": 1, "lat": "28.6219", "lon": "77.0878", "display_name": "Janakpuri"}]"#,
        )
        .unwrap();
        assert_eq!(hits[0].coordinate().unwrap(), Coordinate::new(28.6219, 77.0878));

        let bad = SearchHit {
            lat: "north".to_string(),
            lon: "77.0".to_string(),
        };
        assert!(matches!(bad.coordinate(), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_hit_is_rejected() {
        for (lat, lon) in [("91.5", "77.0"), ("28.6", "-180.5"), ("NaN", "77.0")] {
            let hit = SearchHit {
                lat: lat.to_string(),
                lon: lon.to_string(),
            };
            assert!(
                matches!(hit.coordinate(), Err(ApiError::Parse(_))),
                "{}, {}",
                lat,
                lon
            );
        }
    }

    #[tokio::test]
    async fn test_empty_address_skips_request() {
        let client = GeocodingClient::new("http://127.0.0.1:9", "aidly-test", Duration::from_millis(50))
            .unwrap();
        assert_eq!(client.geocode("   ").await.unwrap(), None);
    }
}
