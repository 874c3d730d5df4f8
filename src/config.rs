// Configuration for Trip Planner
// Loaded once at startup from a JSON file; every field has a default

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TRIP_PLANNER_CONFIG";

/// Where the seed documents are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SeedSourceConfig {
    /// Documents compiled into the binary
    Bundled,
    Directory { path: PathBuf },
    Http { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeedConfig {
    pub source: SeedSourceConfig,
    pub timeout_secs: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            source: SeedSourceConfig::Bundled,
            timeout_secs: 15,
        }
    }
}

impl SeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Offline cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Name of the current cache generation; change it on every deployment
    pub generation: String,
    /// Base URL the app shell paths are resolved against
    pub origin: String,
    /// Synchronization hosts, never intercepted
    pub sync_hosts: Vec<String>,
    /// Map tile hosts (subdomains match too)
    pub tile_hosts: Vec<String>,
    /// Hosts serving immutable third-party libraries and fonts
    pub third_party_hosts: Vec<String>,
    /// First-party assets precached on install, relative to `origin`
    pub app_shell: Vec<String>,
    /// Third-party assets precached on install
    pub third_party_assets: Vec<String>,
    /// Document served for offline navigations
    pub root_document: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let shell = [
            "./",
            "./index.html",
            "./manifest.json",
            "./css/style.css",
            "./css/leaflet-override.css",
            "./js/app.js",
            "./js/db.js",
            "./js/utils/date.js",
            "./js/utils/geo.js",
            "./js/components/NavBar.js",
            "./js/components/ActivityCard.js",
            "./js/components/ActivityModal.js",
            "./js/components/ItineraryView.js",
            "./js/components/WishlistView.js",
            "./js/components/NearbyView.js",
            "./js/components/DontMissView.js",
            "./js/components/ProfileView.js",
            "./data/attractions.json",
            "./data/restaurants.json",
            "./data/mt-fuji.json",
            "./data/neighborhoods.json",
            "./icons/icon-192.svg",
            "./icons/icon-512.svg",
        ];
        let third_party = [
            "https://unpkg.com/vue@3/dist/vue.global.prod.js",
            "https://unpkg.com/dexie@3/dist/dexie.js",
            "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js",
            "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css",
            "https://unpkg.com/sortablejs@1.15.0/Sortable.min.js",
        ];

        Self {
            generation: "tokyo-trip-v5".to_string(),
            origin: "http://localhost:8080/".to_string(),
            sync_hosts: vec!["dexie.cloud".to_string()],
            tile_hosts: vec!["tile.openstreetmap.org".to_string()],
            third_party_hosts: vec![
                "unpkg.com".to_string(),
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            app_shell: shell.iter().map(|s| s.to_string()).collect(),
            third_party_assets: third_party.iter().map(|s| s.to_string()).collect(),
            root_document: "./index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    /// Separate database file holding offline cache generations
    pub cache_database_file: String,
    pub seed: SeedConfig,
    pub cache: CacheConfig,
    /// Remote sync service, when multi-device sync is enabled
    pub sync_endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: "trip.db".to_string(),
            cache_database_file: "offline-cache.db".to_string(),
            seed: SeedConfig::default(),
            cache: CacheConfig::default(),
            sync_endpoint: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trip-planner")
}

impl AppConfig {
    /// Resolve configuration: `$TRIP_PLANNER_CONFIG`, else `<data_dir>/config.json`, else defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let fallback = default_data_dir().join("config.json");
        if fallback.exists() {
            return Self::from_file(&fallback);
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn cache_database_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_database_file)
    }
}
