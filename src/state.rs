// State management for Trip Planner

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::{CacheStorage, HttpFetcher, OfflineCache};
use crate::calendar::TripCalendar;
use crate::config::{AppConfig, SeedSourceConfig};
use crate::database::DatabaseManager;
use crate::error::{Result, TripError};
use crate::planner::TripPlanner;
use crate::seed::{self, BundledSeedSource, DirectorySeedSource, HttpSeedSource, SeedOutcome, SeedSource};

/// Wrapper around DatabaseManager for shared access
pub struct DbWrapper {
    inner: Arc<DatabaseManager>,
}

impl DbWrapper {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            inner: Arc::new(db),
        }
    }

    pub fn inner(&self) -> &DatabaseManager {
        &self.inner
    }

    pub fn arc(&self) -> Arc<DatabaseManager> {
        self.inner.clone()
    }
}

impl std::ops::Deref for DbWrapper {
    type Target = DatabaseManager;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A non-fatal problem the user should see (the app keeps running)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub recorded_at: String,
}

pub struct AppState {
    config: AppConfig,
    calendar: TripCalendar,
    /// Database manager for SQLite persistence
    database: Arc<RwLock<Option<DbWrapper>>>,
    diagnostics: Arc<RwLock<Vec<Diagnostic>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            calendar: TripCalendar::default(),
            database: Arc::new(RwLock::new(None)),
            diagnostics: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_calendar(mut self, calendar: TripCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn calendar(&self) -> &TripCalendar {
        &self.calendar
    }

    /// Open the store and bring the seed data up to date.
    /// A store that cannot be opened is fatal; seeding problems become diagnostics.
    pub async fn initialize(&self) -> Result<Option<SeedOutcome>> {
        let db = DatabaseManager::open(self.config.database_path())?;
        self.init_database(db).await;
        Ok(self.run_seed().await)
    }

    /// Install an already opened database
    pub async fn init_database(&self, db: DatabaseManager) {
        let mut guard = self.database.write().await;
        *guard = Some(DbWrapper::new(db));
    }

    /// Get the database Arc for sharing with background tasks
    pub async fn db(&self) -> Result<Arc<DatabaseManager>> {
        let guard = self.database.read().await;
        guard
            .as_ref()
            .map(DbWrapper::arc)
            .ok_or_else(|| TripError::StorageUnavailable("Database not initialized".to_string()))
    }

    pub async fn planner(&self) -> Result<TripPlanner> {
        Ok(TripPlanner::new(self.db().await?, self.calendar))
    }

    /// Configured seed document source
    pub fn seed_source(&self) -> Box<dyn SeedSource> {
        match &self.config.seed.source {
            SeedSourceConfig::Bundled => Box::new(BundledSeedSource),
            SeedSourceConfig::Directory { path } => Box::new(DirectorySeedSource::new(path.clone())),
            SeedSourceConfig::Http { base_url } => Box::new(HttpSeedSource::new(base_url.clone())),
        }
    }

    /// Run the seed protocol against the configured source. Never fails; problems are recorded.
    pub async fn run_seed(&self) -> Option<SeedOutcome> {
        let db = match self.db().await {
            Ok(db) => db,
            Err(e) => {
                self.report(format!("Cannot seed: {}", e)).await;
                return None;
            }
        };

        let source = self.seed_source();
        match seed::seed_database(&db, source.as_ref(), self.config.seed.timeout()).await {
            Ok(outcome) => {
                if let SeedOutcome::Seeded(ref report) = outcome {
                    if !report.is_complete() {
                        self.report(format!(
                            "{} seed records could not be loaded; they will be retried next start",
                            report.failures.len()
                        ))
                        .await;
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                self.report(format!("Trip data could not be loaded from {}: {}", source.describe(), e))
                    .await;
                None
            }
        }
    }

    /// Destroy every collection, then reopen and reseed
    pub async fn reset_all_data(&self) -> Result<Option<SeedOutcome>> {
        {
            let mut guard = self.database.write().await;
            if let Some(wrapper) = guard.as_ref() {
                if let Err(e) = wrapper.delete_database() {
                    log::error!("Failed to delete trip data: {}", e);
                    // The old connection is closed by now, put a live one back
                    *guard = match DatabaseManager::open(self.config.database_path()) {
                        Ok(db) => Some(DbWrapper::new(db)),
                        Err(reopen) => {
                            log::error!("Failed to reopen database after a failed reset: {}", reopen);
                            None
                        }
                    };
                    return Err(e);
                }
            }
            *guard = None;
        }
        log::warn!("All trip data deleted, reseeding");
        self.initialize().await
    }

    /// Open the offline cache with a live HTTP fetcher
    pub fn open_offline_cache(&self) -> Result<OfflineCache> {
        let storage = Arc::new(CacheStorage::open(&self.config.cache_database_path())?);
        let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(30))?);
        OfflineCache::new(self.config.cache.clone(), storage, fetcher)
    }

    pub async fn report(&self, message: String) {
        log::error!("{}", message);
        self.diagnostics.write().await.push(Diagnostic {
            message,
            recorded_at: Utc::now().to_rfc3339(),
        });
    }

    pub async fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.read().await.clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Collection, NewItineraryItem, TimeSlot};
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_seeds_bundled_data() {
        let dir = tempdir().unwrap();
        let state = AppState::new(config_in(dir.path()));

        let outcome = state.initialize().await.unwrap();
        assert!(matches!(outcome, Some(SeedOutcome::Seeded(_))));
        assert!(state.diagnostics().await.is_empty());

        let db = state.db().await.unwrap();
        assert!(db.count(Collection::Places).unwrap() > 0);
        assert_eq!(db.count(Collection::Members).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_seed_source_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.seed.source = SeedSourceConfig::Directory {
            path: dir.path().join("missing"),
        };
        let state = AppState::new(config);

        assert!(state.initialize().await.unwrap().is_none());
        assert_eq!(state.diagnostics().await.len(), 1);
        assert!(state.db().await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_restores_seed_and_drops_user_data() {
        let dir = tempdir().unwrap();
        let state = AppState::new(config_in(dir.path()));
        state.initialize().await.unwrap();

        let planner = state.planner().await.unwrap();
        let seeded = planner.db().count(Collection::Itinerary).unwrap();
        planner
            .add_itinerary_item(&NewItineraryItem::custom("Arcade", 5, TimeSlot::Evening))
            .unwrap();

        state.reset_all_data().await.unwrap();

        let db = state.db().await.unwrap();
        assert_eq!(db.count(Collection::Itinerary).unwrap(), seeded);
        assert!(!planner.db().is_open());
    }

    #[tokio::test]
    async fn test_failed_reset_keeps_a_usable_database() {
        let dir = tempdir().unwrap();
        let state = AppState::new(config_in(dir.path()));
        state.initialize().await.unwrap();

        // A directory where the shared-memory file would be cannot be removed as a file
        let mut blocker = state.config().database_path().into_os_string();
        blocker.push("-shm");
        std::fs::create_dir(&blocker).unwrap();

        assert!(state.reset_all_data().await.is_err());

        let db = state.db().await.unwrap();
        assert!(db.is_open());
        assert!(db.count(Collection::Places).is_ok());
    }

    #[tokio::test]
    async fn test_uninitialized_state() {
        let state = AppState::default();
        assert!(matches!(state.db().await.unwrap_err(), TripError::StorageUnavailable(_)));
    }
}
