// src/models.rs

use serde::{Deserialize, Serialize};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// A hospital or clinic from the facility table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub address: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub phone: String,
    pub emergency: bool,
    #[serde(default)]
    pub specialties: Vec<String>,
}

/// A facility annotated for one proximity query.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub facility: Facility,
    /// Unrounded great-circle distance, used for filtering and ordering
    #[serde(skip)]
    pub distance_km: f64,
    /// Display form, e.g. "1.5 km"
    pub distance: String,
    pub directions_url: String,
}
