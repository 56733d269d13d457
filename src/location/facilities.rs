// src/location/facilities.rs
//
// The facility table: an embedded JSON resource, optionally replaced by a file

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use crate::models::Facility;

const EMBEDDED_FACILITIES: &str = include_str!("../../data/facilities.json");

/// Read-only list of facilities shared across queries
#[derive(Debug, Clone)]
pub struct FacilityTable {
    facilities: Arc<[Facility]>,
}

impl FacilityTable {
    /// The West Delhi hospital table bundled with the crate
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_FACILITIES).context("Failed to parse embedded facility table")
    }

    /// Load a table from a JSON file with the same layout as `data/facilities.json`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read facility table {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse facility table {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let facilities: Vec<Facility> = serde_json::from_str(json)?;
        Self::from_facilities(facilities)
    }

    /// Every facility must carry a valid coordinate.
    pub fn from_facilities(facilities: Vec<Facility>) -> Result<Self> {
        for facility in &facilities {
            if !facility.coordinate.is_valid() {
                bail!(
                    "Facility '{}' has an out of range coordinate ({}, {})",
                    facility.name,
                    facility.coordinate.lat,
                    facility.coordinate.lng
                );
            }
        }
        debug!("Facility table holds {} entries", facilities.len());
        Ok(Self {
            facilities: facilities.into(),
        })
    }

    /// The configured file when one is given, otherwise the embedded table.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let table = match path {
            Some(path) => {
                info!("Loading facility table from {}", path);
                Self::from_path(path)?
            }
            None => {
                info!("Using embedded facility table");
                Self::embedded()?
            }
        };
        info!("Loaded {} facilities", table.len());
        Ok(table)
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
