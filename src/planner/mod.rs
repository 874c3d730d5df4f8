//! Trip planning operations
//!
//! The contract the itinerary, wishlist, nearby, don't-miss and profile
//! screens use. Every call reads or writes through the store; results are
//! rebuilt from current state on each call.

pub mod map_actions;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::calendar::TripCalendar;
use crate::database::{
    BackupDocument, Category, Collection, DatabaseManager, FamilyMember, ItemStatus, ItineraryItem,
    ItineraryPatch, MemberPatch, NewItineraryItem, NewWishlistItem, Place, PlaceFilter, PlaceQuery,
    Provenance, TimeSlot, WishlistItem, WishlistPatch,
};
use crate::error::{Result, TripError};
use crate::geo::{self, GeoPoint, NearbyPlace};

pub use map_actions::{MapAction, MapActionDispatcher, MapActionSender, MapOutcome};

/// Most places listed by the nearby view
pub const NEARBY_LIMIT: usize = 20;
/// Most suggestions offered by the place picker
pub const PICKER_LIMIT: usize = 10;

/// An itinerary item with its resolved place and display name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub item: ItineraryItem,
    pub place: Option<Place>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPlan {
    pub time_slot: TimeSlot,
    pub entries: Vec<PlanEntry>,
}

/// One day of the itinerary, grouped by time slot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day_index: i32,
    pub label: String,
    pub full_label: String,
    pub title: String,
    pub is_transit_day: bool,
    pub slots: Vec<SlotPlan>,
    pub total: usize,
    pub done: usize,
}

impl DayPlan {
    pub fn slot(&self, time_slot: TimeSlot) -> Option<&SlotPlan> {
        self.slots.iter().find(|s| s.time_slot == time_slot)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub item: WishlistItem,
    pub place: Option<Place>,
    pub display_name: String,
}

/// A priority place already on the itinerary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPriority {
    pub place: Place,
    pub day_label: String,
    pub time_slot: TimeSlot,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DontMiss {
    pub scheduled: Vec<ScheduledPriority>,
    pub unscheduled: Vec<Place>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    pub total_planned: usize,
    pub total_done: usize,
    pub wishlist_count: usize,
    pub total_places: usize,
}

pub struct TripPlanner {
    db: Arc<DatabaseManager>,
    calendar: TripCalendar,
}

impl TripPlanner {
    pub fn new(db: Arc<DatabaseManager>, calendar: TripCalendar) -> Self {
        Self { db, calendar }
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn calendar(&self) -> &TripCalendar {
        &self.calendar
    }

    // ===== Itinerary =====

    /// Append a new item to its day
    pub fn add_itinerary_item(&self, new_item: &NewItineraryItem) -> Result<ItineraryItem> {
        let item = self.db.insert_itinerary_item(new_item)?;
        log::info!("Added itinerary item {} to day {} ({})", item.id, item.day_index, item.time_slot.as_str());
        Ok(item)
    }

    pub fn edit_itinerary_item(&self, id: &str, patch: &ItineraryPatch) -> Result<ItineraryItem> {
        self.db.update_itinerary_item(id, patch)
    }

    /// Flip planned <-> done
    pub fn toggle_itinerary_status(&self, id: &str) -> Result<ItineraryItem> {
        let item = self
            .db
            .get_itinerary_item(id)?
            .ok_or_else(|| TripError::not_found("itinerary", id))?;
        self.db
            .update_itinerary_item(id, &ItineraryPatch::status(item.status.toggled()))
    }

    pub fn delete_itinerary_item(&self, id: &str) -> Result<()> {
        self.db.delete_itinerary_item(id)
    }

    /// Apply a drag result: `ordered_ids` now sit in (`day_index`, `time_slot`) with sort orders 0..n.
    /// Each item is written separately, so a concurrent reader may see a partial renumbering.
    pub fn reorder_slot(&self, day_index: i32, time_slot: TimeSlot, ordered_ids: &[String]) -> Result<()> {
        crate::database::validate_day_index(day_index)?;
        for (position, id) in ordered_ids.iter().enumerate() {
            let patch = ItineraryPatch {
                day_index: Some(day_index),
                time_slot: Some(time_slot),
                sort_order: Some(position as i32),
                ..Default::default()
            };
            self.db.update_itinerary_item(id, &patch)?;
        }
        Ok(())
    }

    /// Items of one day grouped by time slot, each slot in sort order
    pub fn day_plan(&self, day_index: i32) -> Result<DayPlan> {
        crate::database::validate_day_index(day_index)?;

        let places = self.db.places_by_id()?;
        let items = self.db.get_items_for_day(day_index)?;
        let total = items.len();
        let done = items.iter().filter(|i| i.is_done()).count();

        let mut slots: Vec<SlotPlan> = TimeSlot::ALL
            .iter()
            .map(|&time_slot| SlotPlan {
                time_slot,
                entries: Vec::new(),
            })
            .collect();

        for item in items {
            let place = item.place_id.as_ref().and_then(|id| places.get(id)).cloned();
            let display_name = item.display_name(place.as_ref());
            if let Some(slot) = slots.iter_mut().find(|s| s.time_slot == item.time_slot) {
                slot.entries.push(PlanEntry {
                    item,
                    place,
                    display_name,
                });
            }
        }

        Ok(DayPlan {
            day_index,
            label: self.calendar.label(day_index).unwrap_or_default(),
            full_label: self.calendar.full_label(day_index).unwrap_or_default(),
            title: self.calendar.day_title(day_index).unwrap_or_default().to_string(),
            is_transit_day: self.calendar.is_transit_day(day_index),
            slots,
            total,
            done,
        })
    }

    // ===== Wishlist =====

    /// Save a place for later. Returns the existing entry if the place is already saved.
    pub fn add_to_wishlist(&self, place_id: &str) -> Result<WishlistItem> {
        if let Some(existing) = self.db.get_wishlist_for_place(place_id)?.into_iter().next() {
            log::debug!("Place {} already on the wishlist", place_id);
            return Ok(existing);
        }

        let place = self
            .db
            .get_place(place_id)?
            .ok_or_else(|| TripError::not_found("places", place_id))?;
        self.db.insert_wishlist_item(&NewWishlistItem::from_place(&place))
    }

    pub fn mark_wishlist_done(&self, id: &str) -> Result<WishlistItem> {
        let patch = WishlistPatch {
            done: Some(true),
            ..Default::default()
        };
        self.db.update_wishlist_item(id, &patch)
    }

    pub fn remove_from_wishlist(&self, id: &str) -> Result<()> {
        self.db.delete_wishlist_item(id)
    }

    /// Draft itinerary item for a wishlist entry. The entry itself is kept.
    pub fn promote_wishlist_item(&self, id: &str, day_index: i32, time_slot: TimeSlot) -> Result<NewItineraryItem> {
        let item = self
            .db
            .get_wishlist_item(id)?
            .ok_or_else(|| TripError::not_found("wishlist", id))?;

        let mut draft = NewItineraryItem::custom(&item.custom_name, day_index, time_slot);
        if item.place_id.is_some() {
            draft.place_id = item.place_id;
            draft.custom_name = String::new();
        }
        Ok(draft)
    }

    /// Wishlist entries matching the filter. Category and member filters need a resolvable place.
    pub fn filtered_wishlist(&self, filter: &PlaceFilter) -> Result<Vec<WishlistEntry>> {
        let places = self.db.places_by_id()?;
        let query = filter
            .search
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let entries = self
            .db
            .get_all_wishlist()?
            .into_iter()
            .filter_map(|item| {
                let place = item.place_id.as_ref().and_then(|id| places.get(id)).cloned();

                if filter.category.is_some() || filter.member.is_some() {
                    let p = place.as_ref()?;
                    if filter.category.map_or(false, |c| p.category != c) {
                        return None;
                    }
                    if filter.member.as_deref().map_or(false, |m| !p.fits_member(m)) {
                        return None;
                    }
                }

                if let Some(ref q) = query {
                    let hit = item.custom_name.to_lowercase().contains(q)
                        || place.as_ref().map_or(false, |p| {
                            p.name.to_lowercase().contains(q) || p.neighborhood.to_lowercase().contains(q)
                        });
                    if !hit {
                        return None;
                    }
                }

                let display_name = item.display_name(place.as_ref());
                Some(WishlistEntry {
                    item,
                    place,
                    display_name,
                })
            })
            .collect();

        Ok(entries)
    }

    // ===== Places =====

    /// Browsable catalog: preset, non-transit places matching the filter
    pub fn browse_places(&self, filter: &PlaceFilter) -> Result<Vec<Place>> {
        let query = PlaceQuery {
            source: Some(Provenance::Preset),
            category: filter.category,
            member: filter.member.clone(),
            search: filter.search.clone(),
            ..Default::default()
        };

        Ok(self
            .db
            .query_places(&query)?
            .into_iter()
            .filter(|p| !p.is_transit() && filter.matches(p))
            .collect())
    }

    /// Place picker suggestions over name, native-script name and neighborhood
    pub fn search_places(&self, query: &str) -> Result<Vec<Place>> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .db
            .get_all_places()?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&q)
                    || p.name_ja.as_deref().map_or(false, |n| n.contains(query.trim()))
                    || p.neighborhood.to_lowercase().contains(&q)
            })
            .take(PICKER_LIMIT)
            .collect())
    }

    /// Create a user-provenance place for a custom activity
    pub fn add_custom_place(
        &self,
        name: &str,
        category: Category,
        neighborhood: &str,
        point: GeoPoint,
    ) -> Result<Place> {
        if name.trim().is_empty() {
            return Err(TripError::InvalidInput("a custom place needs a name".to_string()));
        }

        let id = format!("user-{}", Uuid::new_v4());
        let place = Place::user(&id, name.trim(), category, neighborhood, point.lat, point.lng);
        self.db.insert_place(&place)?;
        Ok(place)
    }

    /// Physical places nearest to `origin`, optionally of one category
    pub fn nearby(&self, origin: GeoPoint, category: Option<Category>) -> Result<Vec<NearbyPlace>> {
        let places = self
            .db
            .get_all_places()?
            .into_iter()
            .filter(|p| !p.is_transit());

        Ok(geo::sort_by_distance(places, origin)
            .into_iter()
            .filter(|n| category.map_or(true, |c| n.place.category == c))
            .take(NEARBY_LIMIT)
            .collect())
    }

    /// Priority places split by whether any itinerary item references them
    pub fn dont_miss(&self) -> Result<DontMiss> {
        let priority = self.db.query_places(&PlaceQuery::priority())?;
        let by_id: HashMap<&str, &Place> = priority.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut scheduled = Vec::new();
        let mut scheduled_ids = HashSet::new();
        for item in self.db.get_all_itinerary()? {
            let Some(place) = item.place_id.as_deref().and_then(|id| by_id.get(id)) else {
                continue;
            };
            scheduled_ids.insert(place.id.clone());
            scheduled.push(ScheduledPriority {
                place: (*place).clone(),
                day_label: self.calendar.full_label(item.day_index).unwrap_or_default(),
                time_slot: item.time_slot,
                status: item.status,
            });
        }

        let unscheduled = priority
            .iter()
            .filter(|p| !scheduled_ids.contains(&p.id))
            .cloned()
            .collect();

        Ok(DontMiss {
            scheduled,
            unscheduled,
        })
    }

    // ===== Profile =====

    pub fn trip_stats(&self) -> Result<TripStats> {
        Ok(TripStats {
            total_planned: self.db.count(Collection::Itinerary)? as usize,
            total_done: self.db.get_items_by_status(ItemStatus::Done)?.len(),
            wishlist_count: self.db.count(Collection::Wishlist)? as usize,
            total_places: self.db.count(Collection::Places)? as usize,
        })
    }

    pub fn members(&self) -> Result<Vec<FamilyMember>> {
        self.db.get_all_members()
    }

    /// Flip a member's active filter flag
    pub fn toggle_member(&self, id: &str) -> Result<FamilyMember> {
        let member = self
            .db
            .get_member(id)?
            .ok_or_else(|| TripError::not_found("members", id))?;
        let patch = MemberPatch {
            active: Some(!member.active),
            ..Default::default()
        };
        self.db.update_member(id, &patch)
    }

    pub fn export_backup(&self) -> Result<BackupDocument> {
        self.db.export_backup()
    }

    pub fn write_backup(&self, dir: &Path) -> Result<PathBuf> {
        self.db.write_backup(dir)
    }
}
