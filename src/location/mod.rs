// src/location/mod.rs

// Proximity ranking of facilities around a reference point, plus the
// remote lookups (geocoding, place details) that feed it

mod config;
pub mod facilities;
pub mod geocode;
pub mod place_details;
mod utils;

use serde::Serialize;

use crate::models::{Coordinate, Facility, RankedResult};

pub use config::EARTH_RADIUS_KM;
pub use facilities::FacilityTable;
pub use geocode::{Geocoder, GeocodingClient};
pub use place_details::{HospitalDetails, PlaceDetailsClient, PlaceDetailsService};
pub use utils::{calculate_haversine_distance, directions_url, format_distance};

/// Where the reference coordinate of a query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    UserLocation,
    Default,
}

/// Use the caller's location when they shared one, otherwise the configured default.
pub fn resolve_reference(
    user_location: Option<Coordinate>,
    default: Coordinate,
) -> (Coordinate, ReferenceSource) {
    match user_location {
        Some(coordinate) => (coordinate, ReferenceSource::UserLocation),
        None => (default, ReferenceSource::Default),
    }
}

/// Rank the facilities within `radius_km` of `reference`, nearest first.
///
/// Filtering and ordering use the unrounded distance; rounding only happens in
/// the display string, so a facility at 5.04 km is outside a 5 km radius even
/// though it would be shown as "5.0 km". Equal distances keep table order.
///
/// Callers must pass a valid reference and a positive radius.
pub fn find_nearby(
    reference: Coordinate,
    radius_km: f64,
    facilities: &[Facility],
) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = facilities
        .iter()
        .filter_map(|facility| {
            let distance_km = calculate_haversine_distance(reference, facility.coordinate);
            (distance_km <= radius_km).then(|| RankedResult {
                facility: facility.clone(),
                distance_km,
                distance: format_distance(distance_km),
                directions_url: directions_url(reference, facility.coordinate),
            })
        })
        .collect();

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}
