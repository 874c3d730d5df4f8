// Places repository for Trip Planner
// Handles CRUD and indexed queries for points of interest

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

use super::models::{Category, Place, Provenance};
use super::DatabaseManager;
use crate::error::{Result, TripError};

const PLACE_COLUMNS: &str = "id, name, name_ja, category, neighborhood, lat, lng, notes, \
     price_range, duration, hours, tags, member_fit, priority, image_emoji, source";

/// Indexed place query. Every present field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct PlaceQuery {
    pub source: Option<Provenance>,
    pub category: Option<Category>,
    pub priority: Option<bool>,
    pub neighborhood: Option<String>,
    pub tag: Option<String>,
    pub member: Option<String>,
    /// Case-insensitive substring across name, native-script name, neighborhood and tags
    pub search: Option<String>,
}

impl PlaceQuery {
    pub fn source(source: Provenance) -> Self {
        Self {
            source: Some(source),
            ..Default::default()
        }
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    pub fn priority() -> Self {
        Self {
            priority: Some(true),
            ..Default::default()
        }
    }

    pub fn search(query: &str) -> Self {
        Self {
            search: Some(query.to_string()),
            ..Default::default()
        }
    }
}

impl DatabaseManager {
    /// Get a place by ID
    pub fn get_place(&self, id: &str) -> Result<Option<Place>> {
        self.with_connection(|conn| get_place_impl(conn, id))
    }

    /// Get all places, ordered by name
    pub fn get_all_places(&self) -> Result<Vec<Place>> {
        self.with_connection(|conn| query_places_impl(conn, &PlaceQuery::default()))
    }

    /// Query places through the declared indexes
    pub fn query_places(&self, query: &PlaceQuery) -> Result<Vec<Place>> {
        self.with_connection(|conn| query_places_impl(conn, query))
    }

    /// All places keyed by id, for resolving weak references from itinerary and wishlist rows
    pub fn places_by_id(&self) -> Result<HashMap<String, Place>> {
        Ok(self
            .get_all_places()?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect())
    }

    /// Insert a new place. Fails with `ConstraintViolation` if the id is taken.
    pub fn insert_place(&self, place: &Place) -> Result<()> {
        self.with_connection(|conn| {
            if get_place_impl(conn, &place.id)?.is_some() {
                return Err(TripError::ConstraintViolation {
                    collection: "places",
                    id: place.id.clone(),
                });
            }
            upsert_place_impl(conn, place)
        })
    }

    /// Insert or replace a place keyed by id
    pub fn upsert_place(&self, place: &Place) -> Result<()> {
        self.with_connection(|conn| upsert_place_impl(conn, place))
    }

    /// Delete a place. Absent ids are not an error.
    pub fn delete_place(&self, id: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM places WHERE id = ?", params![id])?;
            Ok(())
        })
    }

    /// Delete every place of the given provenance, returning how many were removed
    pub fn delete_places_by_source(&self, source: Provenance) -> Result<usize> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM places WHERE source = ?", params![source])?;
            Ok(removed)
        })
    }
}

pub(super) fn json_vec(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn place_from_row(row: &Row<'_>) -> rusqlite::Result<Place> {
    Ok(Place {
        id: row.get(0)?,
        name: row.get(1)?,
        name_ja: row.get(2)?,
        category: row.get(3)?,
        neighborhood: row.get(4)?,
        lat: row.get(5)?,
        lng: row.get(6)?,
        notes: row.get(7)?,
        price_range: row.get(8)?,
        duration: row.get(9)?,
        hours: row.get(10)?,
        tags: json_vec(row, 11)?,
        member_fit: json_vec(row, 12)?,
        priority: row.get::<_, i32>(13)? != 0,
        image_emoji: row.get(14)?,
        source: row.get(15)?,
    })
}

fn get_place_impl(conn: &Connection, id: &str) -> Result<Option<Place>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM places WHERE id = ?", PLACE_COLUMNS))?;
    let place = stmt.query_row(params![id], place_from_row).optional()?;
    Ok(place)
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn query_places_impl(conn: &Connection, query: &PlaceQuery) -> Result<Vec<Place>> {
    let mut sql = format!("SELECT {} FROM places WHERE 1 = 1", PLACE_COLUMNS);
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(source) = query.source {
        sql.push_str(" AND source = ?");
        params_vec.push(Box::new(source));
    }
    if let Some(category) = query.category {
        sql.push_str(" AND category = ?");
        params_vec.push(Box::new(category));
    }
    if let Some(priority) = query.priority {
        sql.push_str(" AND priority = ?");
        params_vec.push(Box::new(priority as i32));
    }
    if let Some(ref neighborhood) = query.neighborhood {
        sql.push_str(" AND neighborhood = ?");
        params_vec.push(Box::new(neighborhood.clone()));
    }
    if let Some(ref tag) = query.tag {
        sql.push_str(" AND id IN (SELECT place_id FROM place_tags WHERE tag = ?)");
        params_vec.push(Box::new(tag.clone()));
    }
    if let Some(ref member) = query.member {
        sql.push_str(" AND id IN (SELECT place_id FROM place_member_fit WHERE member_id = ?)");
        params_vec.push(Box::new(member.clone()));
    }
    if let Some(ref search) = query.search {
        if !search.trim().is_empty() {
            sql.push_str(
                " AND (LOWER(name) LIKE ? ESCAPE '\\' \
                 OR name_ja LIKE ? ESCAPE '\\' \
                 OR LOWER(neighborhood) LIKE ? ESCAPE '\\' \
                 OR id IN (SELECT place_id FROM place_tags WHERE LOWER(tag) LIKE ? ESCAPE '\\'))",
            );
            let pattern = like_pattern(search);
            let native = format!("%{}%", search.trim());
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(native));
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }
    }

    sql.push_str(" ORDER BY name ASC");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let places = stmt.query_map(params_refs.as_slice(), place_from_row)?;

    Ok(places.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn upsert_place_impl(conn: &Connection, place: &Place) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        r#"
        INSERT INTO places (
            id, name, name_ja, category, neighborhood, lat, lng, notes,
            price_range, duration, hours, tags, member_fit, priority, image_emoji, source
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            name_ja = excluded.name_ja,
            category = excluded.category,
            neighborhood = excluded.neighborhood,
            lat = excluded.lat,
            lng = excluded.lng,
            notes = excluded.notes,
            price_range = excluded.price_range,
            duration = excluded.duration,
            hours = excluded.hours,
            tags = excluded.tags,
            member_fit = excluded.member_fit,
            priority = excluded.priority,
            image_emoji = excluded.image_emoji,
            source = excluded.source
        "#,
        params![
            place.id,
            place.name,
            place.name_ja,
            place.category,
            place.neighborhood,
            place.lat,
            place.lng,
            place.notes,
            place.price_range,
            place.duration,
            place.hours,
            serde_json::to_string(&place.tags)?,
            serde_json::to_string(&place.member_fit)?,
            place.priority as i32,
            place.image_emoji,
            place.source,
        ],
    )?;

    tx.execute("DELETE FROM place_tags WHERE place_id = ?", params![place.id])?;
    for tag in &place.tags {
        tx.execute(
            "INSERT OR IGNORE INTO place_tags (place_id, tag) VALUES (?1, ?2)",
            params![place.id, tag],
        )?;
    }

    tx.execute("DELETE FROM place_member_fit WHERE place_id = ?", params![place.id])?;
    for member in &place.member_fit {
        tx.execute(
            "INSERT OR IGNORE INTO place_member_fit (place_id, member_id) VALUES (?1, ?2)",
            params![place.id, member],
        )?;
    }

    tx.commit()?;
    Ok(())
}
