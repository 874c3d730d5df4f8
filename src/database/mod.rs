// Database module for Trip Planner
// Provides SQLite persistence for places, itinerary, wishlist, family members and settings

pub mod manager;
pub mod migrations;
pub mod models;
pub mod settings_repo;
pub mod places_repo;
pub mod itinerary_repo;
pub mod wishlist_repo;
pub mod members_repo;
pub mod backup_repo;

pub use manager::{Collection, DatabaseManager};
pub use models::*;
pub use places_repo::PlaceQuery;
