// Database models - Wishlist
use serde::{Deserialize, Serialize};

use super::Place;

/// "Added by" marker meaning the whole family
pub const ADDED_BY_ALL: &str = "all";

/// A place (or custom idea) saved for later
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: String,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Family member id, or "all"
    #[serde(default = "default_added_by")]
    pub added_by: String,
}

fn default_added_by() -> String {
    ADDED_BY_ALL.to_string()
}

impl WishlistItem {
    pub fn display_name(&self, place: Option<&Place>) -> String {
        if !self.custom_name.trim().is_empty() {
            return self.custom_name.clone();
        }
        match place {
            Some(p) => p.name.clone(),
            None => super::CUSTOM_ACTIVITY_NAME.to_string(),
        }
    }
}

/// Input for a new wishlist entry. The id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlistItem {
    pub place_id: Option<String>,
    pub custom_name: String,
    pub priority: bool,
    pub tags: Vec<String>,
    pub added_by: String,
}

impl NewWishlistItem {
    /// Wishlist entry for a place; priority and tags are inherited at add time
    pub fn from_place(place: &Place) -> Self {
        Self {
            place_id: Some(place.id.clone()),
            custom_name: String::new(),
            priority: place.priority,
            tags: place.tags.clone(),
            added_by: default_added_by(),
        }
    }
}

/// Partial update for a wishlist entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistPatch {
    pub custom_name: Option<String>,
    pub done: Option<bool>,
    pub priority: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub added_by: Option<String>,
}

impl WishlistPatch {
    pub fn apply_to(&self, item: &mut WishlistItem) {
        if let Some(ref custom_name) = self.custom_name {
            item.custom_name = custom_name.clone();
        }
        if let Some(done) = self.done {
            item.done = done;
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(ref tags) = self.tags {
            item.tags = tags.clone();
        }
        if let Some(ref added_by) = self.added_by {
            item.added_by = added_by.clone();
        }
    }
}
