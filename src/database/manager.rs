// Database Manager for Trip Planner
// Owns the SQLite connection and provides access to the collection repositories

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::migrations;
use crate::error::{Result, TripError};

/// The five record collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Places,
    Itinerary,
    Wishlist,
    Members,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Places,
        Collection::Itinerary,
        Collection::Wishlist,
        Collection::Members,
        Collection::Settings,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Collection::Places => "places",
            Collection::Itinerary => "itinerary",
            Collection::Wishlist => "wishlist",
            Collection::Members => "members",
            Collection::Settings => "settings",
        }
    }
}

/// Database manager that owns the SQLite connection.
///
/// Every mutating call commits before returning, so a later query from any caller
/// in the process observes it. The connection stays open for the process lifetime
/// unless `close()` or `delete_database()` is called.
#[derive(Debug)]
pub struct DatabaseManager {
    conn: Mutex<Option<Connection>>,
    db_path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open (or create) the database at the specified path and bring the schema up to date.
    /// Safe to call repeatedly against the same file.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TripError::StorageUnavailable(format!(
                    "Failed to create database directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let conn = Connection::open(&db_path).map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to open database {:?}: {}", db_path, e))
        })?;
        let conn = Self::prepare(conn)?;

        log::info!("Database initialized at: {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: Some(db_path),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to open in-memory database: {}", e))
        })?;
        let conn = Self::prepare(conn)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: None,
        })
    }

    fn prepare(conn: Connection) -> Result<Connection> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| TripError::StorageUnavailable(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::run_migrations(&conn).map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to run database migrations: {}", e))
        })?;

        Ok(conn)
    }

    /// Execute a function with access to the database connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.conn.lock().map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to lock database connection: {}", e))
        })?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| TripError::StorageUnavailable("Database is closed".to_string()))?;
        f(conn)
    }

    /// Get the database path (None for in-memory databases)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Close the connection. Later calls fail with `StorageUnavailable`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to lock database connection: {}", e))
        })?;

        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| TripError::Sqlite(e))?;
            log::info!("Database closed");
        }
        Ok(())
    }

    /// Destroy every collection by removing the database file. The manager stays closed;
    /// the caller is responsible for reopening and reseeding afterwards.
    pub fn delete_database(&self) -> Result<()> {
        self.close()?;

        let Some(path) = self.db_path.as_ref() else {
            return Ok(());
        };

        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut candidate = path.clone().into_os_string();
            candidate.push(suffix);
            let candidate = PathBuf::from(candidate);
            if candidate.exists() {
                std::fs::remove_file(&candidate)?;
            }
        }

        log::warn!("Database deleted: {:?}", path);
        Ok(())
    }

    /// Remove every record in a collection
    pub fn clear(&self, collection: Collection) -> Result<()> {
        self.with_connection(|conn| {
            let removed = conn.execute(&format!("DELETE FROM {}", collection.table()), [])?;
            log::debug!("Cleared {} rows from {}", removed, collection.table());
            Ok(())
        })
    }

    /// Number of records in a collection
    pub fn count(&self, collection: Collection) -> Result<i64> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", collection.table()),
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
