// src/location/utils.rs
//
// Utility functions for geospatial calculations

use super::config::{DIRECTIONS_BASE_URL, EARTH_RADIUS_KM, TRAVEL_MODE};
use crate::models::Coordinate;

/// Calculate the Haversine distance between two points in kilometers
pub fn calculate_haversine_distance(from: Coordinate, to: Coordinate) -> f64 {
    // Convert degrees to radians
    let lat1_rad = from.lat.to_radians();
    let lon1_rad = from.lng.to_radians();
    let lat2_rad = to.lat.to_radians();
    let lon2_rad = to.lng.to_radians();

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a =
        (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// One decimal place, e.g. "4.7 km"
pub fn format_distance(distance_km: f64) -> String {
    format!("{:.1} km", distance_km)
}

/// Driving directions link from `origin` to `destination`
pub fn directions_url(origin: Coordinate, destination: Coordinate) -> String {
    format!(
        "{}?api=1&origin={},{}&destination={},{}&travelmode={}",
        DIRECTIONS_BASE_URL, origin.lat, origin.lng, destination.lat, destination.lng, TRAVEL_MODE
    )
}
