// src/lib.rs
pub mod api;
pub mod assistant;
pub mod config;
pub mod image_processing;
pub mod location;
pub mod models;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use assistant::Assistant;
pub use config::AppConfig;
pub use location::{FacilityTable, find_nearby};
pub use models::{Coordinate, Facility, RankedResult};
pub use session::{ChatSession, SessionStore};
