// src/location/place_details.rs
//
// Hospital details from the Mappls place detail API, keyed by eLoc

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::services::error::{ApiError, read_json};
use crate::services::{endpoint, http_client};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Vec<String>,
}

#[async_trait]
pub trait PlaceDetailsService: Send + Sync {
    /// `Ok(None)` for an empty eLoc or a response without a result
    async fn hospital_details(&self, eloc: &str) -> Result<Option<HospitalDetails>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct PlaceDetailResponse {
    result: Option<PlaceDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceDetail {
    name: Option<String>,
    address: Option<String>,
    contact_details: Option<ContactDetails>,
    website: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    average_rating: Option<f64>,
    opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
struct ContactDetails {
    telephone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

// Ratings arrive as either numbers or numeric strings
fn deserialize_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl From<PlaceDetail> for HospitalDetails {
    fn from(detail: PlaceDetail) -> Self {
        Self {
            name: detail.name.unwrap_or_else(|| "Unknown".to_string()),
            address: detail
                .address
                .unwrap_or_else(|| "Address not available".to_string()),
            phone: detail
                .contact_details
                .and_then(|c| c.telephone)
                .unwrap_or_else(|| "N/A".to_string()),
            website: detail.website,
            rating: detail.average_rating,
            opening_hours: detail
                .opening_hours
                .map(|h| h.weekday_text)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct PlaceDetailsClient {
    http_client: reqwest::Client,
    detail_endpoint: String,
}

impl PlaceDetailsClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            detail_endpoint: endpoint(
                base_url,
                &format!("advancedmaps/v1/{}/place_detail", api_key),
            ),
        })
    }
}

#[async_trait]
impl PlaceDetailsService for PlaceDetailsClient {
    async fn hospital_details(&self, eloc: &str) -> Result<Option<HospitalDetails>, ApiError> {
        let eloc = eloc.trim();
        if eloc.is_empty() {
            return Ok(None);
        }

        let url = Url::parse_with_params(&self.detail_endpoint, &[("place_id", eloc)])?;
        debug!("Fetching place detail for eLoc {}", eloc);

        let response = self.http_client.get(url).send().await?;
        let body: PlaceDetailResponse = read_json(response).await?;

        if body.result.is_none() {
            debug!("Place detail for {} has no result", eloc);
        }
        Ok(body.result.map(HospitalDetails::from))
    }
}
