// Settings repository for Trip Planner
// Handles CRUD operations for key-value settings (values stored as JSON text)

use rusqlite::{params, Connection};
use serde_json::Value;

use super::models::Setting;
use super::DatabaseManager;
use crate::error::Result;

impl DatabaseManager {
    /// Get a single setting by key
    pub fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        self.with_connection(|conn| get_setting_impl(conn, key))
    }

    /// Set a single setting
    pub fn set_setting(&self, key: &str, value: &Value) -> Result<()> {
        self.with_connection(|conn| set_setting_impl(conn, key, value))
    }

    /// Get all settings
    pub fn get_all_settings(&self) -> Result<Vec<Setting>> {
        self.with_connection(get_all_settings_impl)
    }

    /// Set a boolean setting
    pub fn set_bool_setting(&self, key: &str, value: bool) -> Result<()> {
        self.set_setting(key, &Value::Bool(value))
    }

    /// Get a boolean setting
    pub fn get_bool_setting(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .get_setting(key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(default))
    }

    /// Get an integer setting. Non-integer values read as absent.
    pub fn get_i64_setting(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_setting(key)?.and_then(|v| v.as_i64()))
    }

    /// Delete a setting by key
    pub fn delete_setting(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?", params![key])?;
            Ok(())
        })
    }
}

fn get_setting_impl(conn: &Connection, key: &str) -> Result<Option<Value>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?")?;

    let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));

    match result {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn set_setting_impl(conn: &Connection, key: &str, value: &Value) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
        params![key, serde_json::to_string(value)?],
    )?;

    Ok(())
}

fn get_all_settings_impl(conn: &Connection) -> Result<Vec<Setting>> {
    let mut stmt = conn.prepare("SELECT key, value, updated_at FROM settings ORDER BY key")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut settings = Vec::new();
    for row in rows {
        let (key, raw, updated_at) = row?;
        settings.push(Setting {
            key,
            value: serde_json::from_str(&raw)?,
            updated_at,
        });
    }

    Ok(settings)
}
