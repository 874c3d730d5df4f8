// Database models - Re-exports all collection models
//
// This module is split into focused files by collection:
// - place.rs: Points of interest, categories, provenance
// - itinerary.rs: Scheduled itinerary items, time slots, patches
// - wishlist.rs: Saved-for-later entries
// - member.rs: Family members
// - settings.rs: Key-value settings and well-known keys
// - backup.rs: Backup export document

/// Stores a string-backed enum as its `as_str()` form and parses it back with `FromStr`
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|e: crate::error::TripError| {
                    rusqlite::types::FromSqlError::Other(Box::new(e))
                })
            }
        }
    };
}

mod place;
mod itinerary;
mod wishlist;
mod member;
mod settings;
mod backup;

pub use place::{Category, Place, PlaceFilter, Provenance, BOOKED_PRICE_RANGE, TRANSIT_NEIGHBORHOOD};
pub use itinerary::{
    validate_day_index, validate_start_time, ItemStatus, ItineraryItem, ItineraryPatch,
    NewItineraryItem, TimeSlot, CUSTOM_ACTIVITY_NAME,
};
pub use wishlist::{NewWishlistItem, WishlistItem, WishlistPatch, ADDED_BY_ALL};
pub use member::{FamilyMember, MemberPatch};
pub use settings::{
    Setting, DB_SEEDED_KEY, GPS_ENABLED_KEY, NEIGHBORHOODS_KEY, SEED_VERSION_KEY,
};
pub use backup::{BackupDocument, BACKUP_FILE_NAME};
