// Wishlist repository for Trip Planner
// Handles CRUD for saved-for-later entries

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::models::{NewWishlistItem, WishlistItem, WishlistPatch};
use super::places_repo::json_vec;
use super::DatabaseManager;
use crate::error::{Result, TripError};

const WISH_COLUMNS: &str = "id, place_id, custom_name, done, priority, tags, added_by";

impl DatabaseManager {
    pub fn get_wishlist_item(&self, id: &str) -> Result<Option<WishlistItem>> {
        self.with_connection(|conn| get_wish_impl(conn, id))
    }

    /// Every wishlist entry, oldest first
    pub fn get_all_wishlist(&self) -> Result<Vec<WishlistItem>> {
        self.with_connection(|conn| {
            query_wishes(
                conn,
                &format!("SELECT {} FROM wishlist ORDER BY created_at ASC, id ASC", WISH_COLUMNS),
                params![],
            )
        })
    }

    /// Entries referencing a place (used as the pre-insert existence check)
    pub fn get_wishlist_for_place(&self, place_id: &str) -> Result<Vec<WishlistItem>> {
        self.with_connection(|conn| {
            query_wishes(
                conn,
                &format!("SELECT {} FROM wishlist WHERE place_id = ? ORDER BY created_at ASC", WISH_COLUMNS),
                params![place_id],
            )
        })
    }

    pub fn get_wishlist_by_done(&self, done: bool) -> Result<Vec<WishlistItem>> {
        self.with_connection(|conn| {
            query_wishes(
                conn,
                &format!("SELECT {} FROM wishlist WHERE done = ? ORDER BY created_at ASC", WISH_COLUMNS),
                params![done as i32],
            )
        })
    }

    /// Insert a new entry with a surrogate id.
    /// Does not check for an existing entry on the same place.
    pub fn insert_wishlist_item(&self, new_item: &NewWishlistItem) -> Result<WishlistItem> {
        let item = WishlistItem {
            id: format!("wish-{}", Uuid::new_v4()),
            place_id: new_item.place_id.clone(),
            custom_name: new_item.custom_name.clone(),
            done: false,
            priority: new_item.priority,
            tags: new_item.tags.clone(),
            added_by: new_item.added_by.clone(),
        };

        self.with_connection(|conn| upsert_wish_impl(conn, &item))?;
        Ok(item)
    }

    /// Insert or replace an entry keyed by id (backup restore and sync)
    pub fn upsert_wishlist_item(&self, item: &WishlistItem) -> Result<()> {
        self.with_connection(|conn| upsert_wish_impl(conn, item))
    }

    pub fn update_wishlist_item(&self, id: &str, patch: &WishlistPatch) -> Result<WishlistItem> {
        self.with_connection(|conn| {
            let mut item = get_wish_impl(conn, id)?.ok_or_else(|| TripError::not_found("wishlist", id))?;
            patch.apply_to(&mut item);
            upsert_wish_impl(conn, &item)?;
            Ok(item)
        })
    }

    /// Delete an entry. Absent ids are not an error.
    pub fn delete_wishlist_item(&self, id: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM wishlist WHERE id = ?", params![id])?;
            Ok(())
        })
    }
}

fn wish_from_row(row: &Row<'_>) -> rusqlite::Result<WishlistItem> {
    Ok(WishlistItem {
        id: row.get(0)?,
        place_id: row.get(1)?,
        custom_name: row.get(2)?,
        done: row.get::<_, i32>(3)? != 0,
        priority: row.get::<_, i32>(4)? != 0,
        tags: json_vec(row, 5)?,
        added_by: row.get(6)?,
    })
}

fn query_wishes(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<WishlistItem>> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt.query_map(params, wish_from_row)?;
    Ok(items.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn get_wish_impl(conn: &Connection, id: &str) -> Result<Option<WishlistItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM wishlist WHERE id = ?", WISH_COLUMNS))?;
    Ok(stmt.query_row(params![id], wish_from_row).optional()?)
}

fn upsert_wish_impl(conn: &Connection, item: &WishlistItem) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO wishlist (id, place_id, custom_name, done, priority, tags, added_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            place_id = excluded.place_id,
            custom_name = excluded.custom_name,
            done = excluded.done,
            priority = excluded.priority,
            tags = excluded.tags,
            added_by = excluded.added_by
        "#,
        params![
            item.id,
            item.place_id,
            item.custom_name,
            item.done as i32,
            item.priority as i32,
            serde_json::to_string(&item.tags)?,
            item.added_by,
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Category, Place, ADDED_BY_ALL};

    fn create_test_db() -> DatabaseManager {
        DatabaseManager::open_in_memory().unwrap()
    }

    fn ramen_place() -> Place {
        let mut place = Place::user("r1", "Ichiran Shibuya", Category::Food, "Shibuya", 35.66, 139.70);
        place.priority = true;
        place.tags = vec!["ramen".to_string()];
        place
    }

    #[test]
    fn test_insert_copies_place_attributes() {
        let db = create_test_db();
        let item = db.insert_wishlist_item(&NewWishlistItem::from_place(&ramen_place())).unwrap();

        assert!(item.id.starts_with("wish-"));
        assert!(item.priority);
        assert!(!item.done);
        assert_eq!(item.tags, vec!["ramen".to_string()]);
        assert_eq!(item.added_by, ADDED_BY_ALL);
        assert_eq!(db.get_wishlist_item(&item.id).unwrap(), Some(item));
    }

    #[test]
    fn test_place_and_done_queries() {
        let db = create_test_db();
        let item = db.insert_wishlist_item(&NewWishlistItem::from_place(&ramen_place())).unwrap();
        assert_eq!(db.get_wishlist_for_place("r1").unwrap().len(), 1);

        let patch = WishlistPatch {
            done: Some(true),
            ..Default::default()
        };
        db.update_wishlist_item(&item.id, &patch).unwrap();
        assert_eq!(db.get_wishlist_by_done(true).unwrap().len(), 1);
        assert_eq!(db.get_wishlist_by_done(false).unwrap().len(), 0);

        db.delete_wishlist_item(&item.id).unwrap();
        assert!(db.get_wishlist_for_place("r1").unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = create_test_db();
        let err = db.update_wishlist_item("wish-x", &WishlistPatch::default()).unwrap_err();
        assert!(matches!(err, TripError::NotFound { collection: "wishlist", .. }));
    }
}
