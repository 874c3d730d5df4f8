// Database models - Itinerary
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Place;
use crate::calendar::TOTAL_DAYS;
use crate::error::{Result, TripError};

/// Fallback display name when an item has neither a custom name nor a resolvable place
pub const CUSTOM_ACTIVITY_NAME: &str = "Custom activity";

static START_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid start time pattern"));

/// Coarse bucket grouping itinerary items within a day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "🌅",
            TimeSlot::Afternoon => "☀️",
            TimeSlot::Evening => "🌙",
        }
    }
}

impl FromStr for TimeSlot {
    type Err = TripError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(TimeSlot::Morning),
            "afternoon" => Ok(TimeSlot::Afternoon),
            "evening" => Ok(TimeSlot::Evening),
            other => Err(TripError::InvalidInput(format!("unknown time slot '{}'", other))),
        }
    }
}

sql_text_enum!(TimeSlot);

/// Itinerary item status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Planned,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Planned => "planned",
            ItemStatus::Done => "done",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ItemStatus::Planned => ItemStatus::Done,
            ItemStatus::Done => ItemStatus::Planned,
        }
    }
}

impl FromStr for ItemStatus {
    type Err = TripError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(ItemStatus::Planned),
            "done" => Ok(ItemStatus::Done),
            other => Err(TripError::InvalidInput(format!("unknown status '{}'", other))),
        }
    }
}

sql_text_enum!(ItemStatus);

/// A scheduled activity on one trip day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryItem {
    pub id: String,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub custom_name: String,
    pub day_index: i32,
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: ItemStatus,
    /// Ordering key within the (day, time slot) scope
    pub sort_order: i32,
}

impl ItineraryItem {
    /// Name shown for the item: custom name, else the referenced place, else a generic label.
    /// A dangling place reference degrades to the generic label.
    pub fn display_name(&self, place: Option<&Place>) -> String {
        if !self.custom_name.trim().is_empty() {
            return self.custom_name.clone();
        }
        match place {
            Some(p) => p.name.clone(),
            None => CUSTOM_ACTIVITY_NAME.to_string(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ItemStatus::Done
    }

    pub fn validate(&self) -> Result<()> {
        validate_day_index(self.day_index)?;
        validate_start_time(self.start_time.as_deref())
    }
}

/// Input for the add-activity flow. Id and sort order are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewItineraryItem {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub custom_name: String,
    pub day_index: i32,
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewItineraryItem {
    pub fn custom(name: &str, day_index: i32, time_slot: TimeSlot) -> Self {
        Self {
            place_id: None,
            custom_name: name.to_string(),
            day_index,
            time_slot,
            start_time: None,
            notes: String::new(),
        }
    }

    pub fn for_place(place_id: &str, day_index: i32, time_slot: TimeSlot) -> Self {
        Self {
            place_id: Some(place_id.to_string()),
            custom_name: String::new(),
            day_index,
            time_slot,
            start_time: None,
            notes: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.place_id.is_none() && self.custom_name.trim().is_empty() {
            return Err(TripError::InvalidInput(
                "an itinerary item needs a place or a custom name".to_string(),
            ));
        }
        validate_day_index(self.day_index)?;
        validate_start_time(self.start_time.as_deref())
    }
}

/// Partial update for an itinerary item.
/// Double options distinguish "leave unchanged" (None) from "clear" (Some(None)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPatch {
    pub place_id: Option<Option<String>>,
    pub custom_name: Option<String>,
    pub day_index: Option<i32>,
    pub time_slot: Option<TimeSlot>,
    pub start_time: Option<Option<String>>,
    pub notes: Option<String>,
    pub status: Option<ItemStatus>,
    pub sort_order: Option<i32>,
}

impl ItineraryPatch {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.place_id.is_none()
            && self.custom_name.is_none()
            && self.day_index.is_none()
            && self.time_slot.is_none()
            && self.start_time.is_none()
            && self.notes.is_none()
            && self.status.is_none()
            && self.sort_order.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(day) = self.day_index {
            validate_day_index(day)?;
        }
        if let Some(Some(ref time)) = self.start_time {
            validate_start_time(Some(time))?;
        }
        Ok(())
    }

    /// Merge the patch into an existing item
    pub fn apply_to(&self, item: &mut ItineraryItem) {
        if let Some(ref place_id) = self.place_id {
            item.place_id = place_id.clone();
        }
        if let Some(ref custom_name) = self.custom_name {
            item.custom_name = custom_name.clone();
        }
        if let Some(day) = self.day_index {
            item.day_index = day;
        }
        if let Some(slot) = self.time_slot {
            item.time_slot = slot;
        }
        if let Some(ref start_time) = self.start_time {
            item.start_time = start_time.clone();
        }
        if let Some(ref notes) = self.notes {
            item.notes = notes.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(sort_order) = self.sort_order {
            item.sort_order = sort_order;
        }
    }
}

pub fn validate_day_index(day_index: i32) -> Result<()> {
    if (0..TOTAL_DAYS).contains(&day_index) {
        Ok(())
    } else {
        Err(TripError::InvalidInput(format!(
            "day index {} outside 0..{}",
            day_index,
            TOTAL_DAYS - 1
        )))
    }
}

/// Empty start times are allowed and mean "no literal time"
pub fn validate_start_time(start_time: Option<&str>) -> Result<()> {
    match start_time {
        Some(t) if !t.is_empty() && !START_TIME_RE.is_match(t) => Err(TripError::InvalidInput(
            format!("start time '{}' is not HH:MM", t),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Category;

    fn item(custom_name: &str, place_id: Option<&str>) -> ItineraryItem {
        ItineraryItem {
            id: "itin-test".to_string(),
            place_id: place_id.map(str::to_string),
            custom_name: custom_name.to_string(),
            day_index: 3,
            time_slot: TimeSlot::Afternoon,
            start_time: None,
            notes: String::new(),
            status: ItemStatus::Planned,
            sort_order: 0,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        let place = Place::user("a6", "Akihabara", Category::KidFriendly, "Akihabara", 35.69, 139.77);

        assert_eq!(item("Museum visit", None).display_name(None), "Museum visit");
        assert_eq!(item("", Some("a6")).display_name(Some(&place)), "Akihabara");
        assert_eq!(item("", Some("gone")).display_name(None), CUSTOM_ACTIVITY_NAME);
    }

    #[test]
    fn test_start_time_validation() {
        assert!(validate_start_time(Some("09:30")).is_ok());
        assert!(validate_start_time(Some("23:59")).is_ok());
        assert!(validate_start_time(Some("")).is_ok());
        assert!(validate_start_time(None).is_ok());
        assert!(validate_start_time(Some("24:00")).is_err());
        assert!(validate_start_time(Some("9:30")).is_err());
    }

    #[test]
    fn test_day_index_bounds() {
        assert!(validate_day_index(0).is_ok());
        assert!(validate_day_index(8).is_ok());
        assert!(validate_day_index(9).is_err());
        assert!(validate_day_index(-1).is_err());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut it = item("Lunch", Some("r1"));
        let patch = ItineraryPatch {
            place_id: Some(None),
            time_slot: Some(TimeSlot::Evening),
            ..Default::default()
        };
        patch.apply_to(&mut it);

        assert_eq!(it.place_id, None);
        assert_eq!(it.time_slot, TimeSlot::Evening);
        assert_eq!(it.custom_name, "Lunch");
        assert_eq!(it.day_index, 3);
    }

    #[test]
    fn test_new_item_requires_a_name_or_place() {
        let mut new = NewItineraryItem::custom("  ", 1, TimeSlot::Morning);
        assert!(new.validate().is_err());
        new.place_id = Some("a1".to_string());
        assert!(new.validate().is_ok());
    }
}
