// Database models - Settings
use serde::{Deserialize, Serialize};

/// Setting key holding the applied seed dataset version
pub const SEED_VERSION_KEY: &str = "seedVersion";
/// Setting key holding bundled neighborhood metadata
pub const NEIGHBORHOODS_KEY: &str = "neighborhoods";
pub const DB_SEEDED_KEY: &str = "dbSeeded";
pub const GPS_ENABLED_KEY: &str = "gpsEnabled";

/// A single key-value setting. Values are arbitrary JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: String,
}
