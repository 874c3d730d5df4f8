// Cache storage for Trip Planner
// Named cache generations of URL -> response, persisted in SQLite

use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::fetcher::FetchResponse;
use crate::error::{Result, TripError};

pub struct CacheStorage {
    conn: Mutex<Connection>,
}

impl CacheStorage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to open cache storage {:?}: {}", path, e))
        })?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_name TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                content_type TEXT,
                body BLOB NOT NULL,
                stored_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (cache_name, url)
            );
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            TripError::StorageUnavailable(format!("Failed to lock cache storage: {}", e))
        })?;
        f(&conn)
    }

    /// Store (or replace) a response under `url` in `cache_name`
    pub fn put(&self, cache_name: &str, url: &str, response: &FetchResponse) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO cache_entries (cache_name, url, status, content_type, body, stored_at)
                VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
                ON CONFLICT(cache_name, url) DO UPDATE SET
                    status = excluded.status,
                    content_type = excluded.content_type,
                    body = excluded.body,
                    stored_at = excluded.stored_at
                "#,
                params![
                    cache_name,
                    url,
                    response.status,
                    response.content_type,
                    response.body.as_ref()
                ],
            )?;
            Ok(())
        })
    }

    /// Cached response for `url` in `cache_name`
    pub fn get(&self, cache_name: &str, url: &str) -> Result<Option<FetchResponse>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, content_type, body FROM cache_entries WHERE cache_name = ?1 AND url = ?2",
            )?;
            let entry = stmt
                .query_row(params![cache_name, url], |row| {
                    Ok(FetchResponse {
                        status: row.get(0)?,
                        content_type: row.get(1)?,
                        body: Bytes::from(row.get::<_, Vec<u8>>(2)?),
                    })
                })
                .optional()?;
            Ok(entry)
        })
    }

    /// Every generation name with at least one entry
    pub fn cache_names(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name")?;
            let names = stmt.query_map([], |row| row.get(0))?;
            Ok(names.collect::<std::result::Result<Vec<String>, _>>()?)
        })
    }

    pub fn keys(&self, cache_name: &str) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT url FROM cache_entries WHERE cache_name = ? ORDER BY url")?;
            let urls = stmt.query_map(params![cache_name], |row| row.get(0))?;
            Ok(urls.collect::<std::result::Result<Vec<String>, _>>()?)
        })
    }

    /// Drop a whole generation, returning the number of entries removed
    pub fn delete_cache(&self, cache_name: &str) -> Result<usize> {
        self.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM cache_entries WHERE cache_name = ?", params![cache_name])?)
        })
    }
}
