// Database migrations for Trip Planner
// Creates and updates the database schema. This is independent of the seed
// dataset version, which lives in the settings collection.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    debug_assert_eq!(get_schema_version(conn)?, SCHEMA_VERSION);
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;

    Ok(version.unwrap_or(0))
}

/// Initial schema creation (version 1)
fn migrate_v1(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v1");

    conn.execute_batch(r#"
        BEGIN;

        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Settings: flat key-value store, values are JSON
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Places: points of interest (preset or user provenance)
        CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            name_ja TEXT,
            category TEXT NOT NULL,
            neighborhood TEXT NOT NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            notes TEXT,
            price_range TEXT,
            duration TEXT,
            hours TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            member_fit TEXT NOT NULL DEFAULT '[]',
            priority INTEGER NOT NULL DEFAULT 0,
            image_emoji TEXT NOT NULL DEFAULT '📍',
            source TEXT NOT NULL DEFAULT 'preset'
        );

        CREATE INDEX IF NOT EXISTS idx_places_category ON places(category);
        CREATE INDEX IF NOT EXISTS idx_places_neighborhood ON places(neighborhood);
        CREATE INDEX IF NOT EXISTS idx_places_priority ON places(priority);
        CREATE INDEX IF NOT EXISTS idx_places_source ON places(source);

        -- Multi-valued place attributes, one row per value
        CREATE TABLE IF NOT EXISTS place_tags (
            place_id TEXT NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (place_id, tag),
            FOREIGN KEY (place_id) REFERENCES places(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_place_tags_tag ON place_tags(tag);

        CREATE TABLE IF NOT EXISTS place_member_fit (
            place_id TEXT NOT NULL,
            member_id TEXT NOT NULL,
            PRIMARY KEY (place_id, member_id),
            FOREIGN KEY (place_id) REFERENCES places(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_place_member_fit_member ON place_member_fit(member_id);

        -- Itinerary: scheduled items, place_id is a weak reference (no FK)
        CREATE TABLE IF NOT EXISTS itinerary (
            id TEXT PRIMARY KEY NOT NULL,
            place_id TEXT,
            custom_name TEXT NOT NULL DEFAULT '',
            day_index INTEGER NOT NULL,
            time_slot TEXT NOT NULL,
            start_time TEXT,
            notes TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'planned',
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_itinerary_day ON itinerary(day_index);
        CREATE INDEX IF NOT EXISTS idx_itinerary_place ON itinerary(place_id);
        CREATE INDEX IF NOT EXISTS idx_itinerary_sort_order ON itinerary(sort_order);
        CREATE INDEX IF NOT EXISTS idx_itinerary_time_slot ON itinerary(time_slot);
        CREATE INDEX IF NOT EXISTS idx_itinerary_status ON itinerary(status);

        -- Wishlist: saved-for-later entries, place_id is a weak reference (no FK)
        CREATE TABLE IF NOT EXISTS wishlist (
            id TEXT PRIMARY KEY NOT NULL,
            place_id TEXT,
            custom_name TEXT NOT NULL DEFAULT '',
            done INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            added_by TEXT NOT NULL DEFAULT 'all',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_wishlist_place ON wishlist(place_id);
        CREATE INDEX IF NOT EXISTS idx_wishlist_done ON wishlist(done);
        CREATE INDEX IF NOT EXISTS idx_wishlist_priority ON wishlist(priority);
        CREATE INDEX IF NOT EXISTS idx_wishlist_added_by ON wishlist(added_by);

        -- Family members
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            emoji TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);

        COMMIT;
    "#)?;

    log::info!("Migration v1 completed successfully");
    Ok(())
}

/// Composite index for the per-day ordered itinerary query (version 2)
fn migrate_v2(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v2 - itinerary day ordering");

    conn.execute_batch(r#"
        BEGIN;

        CREATE INDEX IF NOT EXISTS idx_itinerary_day_slot_order
        ON itinerary(day_index, time_slot, sort_order);

        INSERT INTO schema_version (version) VALUES (2);

        COMMIT;
    "#)?;

    log::info!("Migration v2 completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_migrations_reach_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, SCHEMA_VERSION as i64);
    }

    #[test]
    fn test_query_indexes_are_declared() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let indexes = index_names(&conn);

        for expected in [
            "idx_places_category",
            "idx_places_neighborhood",
            "idx_place_tags_tag",
            "idx_place_member_fit_member",
            "idx_places_priority",
            "idx_places_source",
            "idx_itinerary_day",
            "idx_itinerary_place",
            "idx_itinerary_sort_order",
            "idx_itinerary_time_slot",
            "idx_itinerary_status",
            "idx_wishlist_place",
            "idx_wishlist_done",
            "idx_wishlist_priority",
            "idx_wishlist_added_by",
        ] {
            assert!(indexes.iter().any(|i| i == expected), "missing index {}", expected);
        }
    }
}
