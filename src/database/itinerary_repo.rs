// Itinerary repository for Trip Planner
// Handles CRUD and per-day queries for scheduled itinerary items

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::models::{ItemStatus, ItineraryItem, ItineraryPatch, NewItineraryItem, TimeSlot};
use super::DatabaseManager;
use crate::error::{Result, TripError};

const ITEM_COLUMNS: &str =
    "id, place_id, custom_name, day_index, time_slot, start_time, notes, status, sort_order";

impl DatabaseManager {
    /// Get an itinerary item by ID
    pub fn get_itinerary_item(&self, id: &str) -> Result<Option<ItineraryItem>> {
        self.with_connection(|conn| get_item_impl(conn, id))
    }

    /// Get every itinerary item, ordered by day then sort order
    pub fn get_all_itinerary(&self) -> Result<Vec<ItineraryItem>> {
        self.with_connection(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM itinerary ORDER BY day_index ASC, sort_order ASC, created_at ASC, id ASC",
                    ITEM_COLUMNS
                ),
                params![],
            )
        })
    }

    /// Items of one day, ordered by sort order
    pub fn get_items_for_day(&self, day_index: i32) -> Result<Vec<ItineraryItem>> {
        self.with_connection(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM itinerary WHERE day_index = ? \
                     ORDER BY sort_order ASC, created_at ASC, id ASC",
                    ITEM_COLUMNS
                ),
                params![day_index],
            )
        })
    }

    /// Items of one (day, time slot) pair, ordered by sort order
    pub fn get_items_for_slot(&self, day_index: i32, time_slot: TimeSlot) -> Result<Vec<ItineraryItem>> {
        self.with_connection(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM itinerary WHERE day_index = ? AND time_slot = ? \
                     ORDER BY sort_order ASC, created_at ASC, id ASC",
                    ITEM_COLUMNS
                ),
                params![day_index, time_slot],
            )
        })
    }

    /// Items referencing a place
    pub fn get_items_for_place(&self, place_id: &str) -> Result<Vec<ItineraryItem>> {
        self.with_connection(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM itinerary WHERE place_id = ? ORDER BY day_index ASC, sort_order ASC",
                    ITEM_COLUMNS
                ),
                params![place_id],
            )
        })
    }

    pub fn get_items_by_status(&self, status: ItemStatus) -> Result<Vec<ItineraryItem>> {
        self.with_connection(|conn| {
            query_items(
                conn,
                &format!(
                    "SELECT {} FROM itinerary WHERE status = ? ORDER BY day_index ASC, sort_order ASC",
                    ITEM_COLUMNS
                ),
                params![status],
            )
        })
    }

    /// Add a user-created item. Assigns a surrogate id and appends it to its
    /// (day, slot), one past the highest sort order already there.
    pub fn insert_itinerary_item(&self, new_item: &NewItineraryItem) -> Result<ItineraryItem> {
        new_item.validate()?;

        self.with_connection(|conn| {
            let next_sort_order: i32 = conn.query_row(
                "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM itinerary WHERE day_index = ? AND time_slot = ?",
                params![new_item.day_index, new_item.time_slot],
                |row| row.get(0),
            )?;

            let item = ItineraryItem {
                id: format!("itin-{}", Uuid::new_v4()),
                place_id: new_item.place_id.clone(),
                custom_name: new_item.custom_name.clone(),
                day_index: new_item.day_index,
                time_slot: new_item.time_slot,
                start_time: new_item.start_time.clone().filter(|t| !t.is_empty()),
                notes: new_item.notes.clone(),
                status: ItemStatus::Planned,
                sort_order: next_sort_order,
            };

            upsert_item_impl(conn, &item)?;
            log::debug!("Added itinerary item {} on day {}", item.id, item.day_index);
            Ok(item)
        })
    }

    /// Insert or replace an item keyed by its id
    pub fn upsert_itinerary_item(&self, item: &ItineraryItem) -> Result<()> {
        item.validate()?;
        self.with_connection(|conn| upsert_item_impl(conn, item))
    }

    /// Merge a patch into an existing item and return the updated record
    pub fn update_itinerary_item(&self, id: &str, patch: &ItineraryPatch) -> Result<ItineraryItem> {
        patch.validate()?;
        self.with_connection(|conn| update_item_impl(conn, id, patch))
    }

    /// Delete an item. Absent ids are not an error.
    pub fn delete_itinerary_item(&self, id: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM itinerary WHERE id = ?", params![id])?;
            Ok(())
        })
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItineraryItem> {
    Ok(ItineraryItem {
        id: row.get(0)?,
        place_id: row.get(1)?,
        custom_name: row.get(2)?,
        day_index: row.get(3)?,
        time_slot: row.get(4)?,
        start_time: row.get(5)?,
        notes: row.get(6)?,
        status: row.get(7)?,
        sort_order: row.get(8)?,
    })
}

fn query_items(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ItineraryItem>> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt.query_map(params, item_from_row)?;
    Ok(items.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn get_item_impl(conn: &Connection, id: &str) -> Result<Option<ItineraryItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM itinerary WHERE id = ?", ITEM_COLUMNS))?;
    Ok(stmt.query_row(params![id], item_from_row).optional()?)
}

fn upsert_item_impl(conn: &Connection, item: &ItineraryItem) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO itinerary (
            id, place_id, custom_name, day_index, time_slot, start_time, notes, status, sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            place_id = excluded.place_id,
            custom_name = excluded.custom_name,
            day_index = excluded.day_index,
            time_slot = excluded.time_slot,
            start_time = excluded.start_time,
            notes = excluded.notes,
            status = excluded.status,
            sort_order = excluded.sort_order
        "#,
        params![
            item.id,
            item.place_id,
            item.custom_name,
            item.day_index,
            item.time_slot,
            item.start_time,
            item.notes,
            item.status,
            item.sort_order,
        ],
    )?;

    Ok(())
}

fn update_item_impl(conn: &Connection, id: &str, patch: &ItineraryPatch) -> Result<ItineraryItem> {
    let mut updates = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref place_id) = patch.place_id {
        updates.push("place_id = ?");
        params_vec.push(Box::new(place_id.clone()));
    }
    if let Some(ref custom_name) = patch.custom_name {
        updates.push("custom_name = ?");
        params_vec.push(Box::new(custom_name.clone()));
    }
    if let Some(day_index) = patch.day_index {
        updates.push("day_index = ?");
        params_vec.push(Box::new(day_index));
    }
    if let Some(time_slot) = patch.time_slot {
        updates.push("time_slot = ?");
        params_vec.push(Box::new(time_slot));
    }
    if let Some(ref start_time) = patch.start_time {
        updates.push("start_time = ?");
        params_vec.push(Box::new(start_time.clone().filter(|t| !t.is_empty())));
    }
    if let Some(ref notes) = patch.notes {
        updates.push("notes = ?");
        params_vec.push(Box::new(notes.clone()));
    }
    if let Some(status) = patch.status {
        updates.push("status = ?");
        params_vec.push(Box::new(status));
    }
    if let Some(sort_order) = patch.sort_order {
        updates.push("sort_order = ?");
        params_vec.push(Box::new(sort_order));
    }

    if !updates.is_empty() {
        let sql = format!("UPDATE itinerary SET {} WHERE id = ?", updates.join(", "));
        params_vec.push(Box::new(id.to_string()));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let changed = conn.execute(&sql, params_refs.as_slice())?;
        if changed == 0 {
            return Err(TripError::not_found("itinerary", id));
        }
    }

    get_item_impl(conn, id)?.ok_or_else(|| TripError::not_found("itinerary", id))
}
