// src/location/config.rs
//
// Constants for distance calculation and directions links

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/";
pub const TRAVEL_MODE: &str = "driving";
