// src/bin/nearby_hospitals.rs
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use aidly_lib::config::{self, AppConfig};
use aidly_lib::location::{
    FacilityTable, Geocoder, GeocodingClient, ReferenceSource, find_nearby, resolve_reference,
};
use aidly_lib::models::Coordinate;

#[derive(Parser)]
#[command(author, version, about = "List hospitals near a location", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Latitude of the reference point (requires --lng)
    #[arg(long, requires = "lng")]
    lat: Option<f64>,

    /// Longitude of the reference point (requires --lat)
    #[arg(long, requires = "lat")]
    lng: Option<f64>,

    /// Geocode this address and use it as the reference point
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    address: Option<String>,

    /// Search radius in kilometers
    #[arg(long)]
    radius_km: Option<f64>,

    /// Facility table JSON file (defaults to the embedded table)
    #[arg(long)]
    facilities: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    config::load_env_files();

    let args = Args::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let radius_km = args.radius_km.unwrap_or(config.default_radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        bail!("--radius-km must be positive, got {}", radius_km);
    }

    let user_location = match (args.lat, args.lng, args.address.as_deref()) {
        (Some(lat), Some(lng), _) => Some(Coordinate::new(lat, lng)),
        (_, _, Some(address)) => {
            let geocoder = GeocodingClient::new(
                &config.geocoder_url,
                &config.geocoder_user_agent,
                config.request_timeout(),
            )?;
            let found = geocoder
                .geocode(address)
                .await
                .with_context(|| format!("Error geocoding address '{}'", address))?;
            if found.is_none() {
                warn!("Could not find location: {}", address);
            }
            found
        }
        _ => None,
    };
    if let Some(location) = user_location {
        if !location.is_valid() {
            bail!("Invalid coordinate ({}, {})", location.lat, location.lng);
        }
    }

    let facilities_path = args.facilities.as_deref().or(config.facilities_path.as_deref());
    let table = FacilityTable::load(facilities_path)?;

    let (reference, source) = resolve_reference(user_location, config.default_reference);
    match source {
        ReferenceSource::UserLocation => {
            info!("Using location: {:.4}, {:.4}", reference.lat, reference.lng)
        }
        ReferenceSource::Default => info!("Using the default reference point"),
    }

    let results = find_nearby(reference, radius_km, table.facilities());
    if table.is_empty() {
        warn!("Facility table is empty");
    } else if results.is_empty() {
        warn!("No hospitals found within {} km", radius_km);
    } else {
        info!("Found {} hospitals within {} km", results.len(), radius_km);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let facility = &result.facility;
        println!("{:>2}. {} ({})", i + 1, facility.name, result.distance);
        println!("    {}", facility.address);
        println!(
            "    Phone: {}{}",
            facility.phone,
            if facility.emergency { "  [emergency]" } else { "" }
        );
        if !facility.specialties.is_empty() {
            println!("    Specialties: {}", facility.specialties.join(", "));
        }
        println!("    Directions: {}", result.directions_url);
    }

    Ok(())
}
