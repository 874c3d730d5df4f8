// Error types for Trip Planner
// One taxonomy shared by the store, the seed protocol, the offline cache and geolocation

use thiserror::Error;

/// Errors surfaced by the trip planner data layer
#[derive(Debug, Error)]
pub enum TripError {
    /// The storage medium could not be opened or the schema could not be created.
    /// Fatal to everything that depends on the store.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A get/update addressed a record id that does not exist
    #[error("{collection} record '{id}' not found")]
    NotFound { collection: &'static str, id: String },

    /// A caller-supplied id collided with an existing record on insert
    #[error("{collection} record '{id}' already exists")]
    ConstraintViolation { collection: &'static str, id: String },

    /// One of the external seed documents failed to load
    #[error("Seed source '{document}' unavailable: {message}")]
    SeedSourceUnavailable { document: String, message: String },

    #[error("Geolocation denied or unavailable: {0}")]
    GeolocationDenied(String),

    #[error("Geolocation not supported")]
    GeolocationUnsupported,

    /// A value failed validation before reaching storage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A network fetch failed and no cached copy could stand in for it
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TripError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        TripError::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn seed_source(document: impl Into<String>, message: impl ToString) -> Self {
        TripError::SeedSourceUnavailable {
            document: document.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error makes the whole data layer unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, TripError::StorageUnavailable(_))
    }
}

/// Result type alias for trip planner operations
pub type Result<T> = std::result::Result<T, TripError>;
