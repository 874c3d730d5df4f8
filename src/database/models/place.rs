// Database models - Place
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TripError;

/// Neighborhood value reserved for logistics entries (flights, transfers)
pub const TRANSIT_NEIGHBORHOOD: &str = "Transit";

/// Price-range value reserved for already-booked entries
pub const BOOKED_PRICE_RANGE: &str = "booked";

/// Place category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Food,
    Culture,
    Futuristic,
    KidFriendly,
    Shopping,
    Nature,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Culture,
        Category::Futuristic,
        Category::KidFriendly,
        Category::Shopping,
        Category::Nature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Culture => "culture",
            Category::Futuristic => "futuristic",
            Category::KidFriendly => "kid-friendly",
            Category::Shopping => "shopping",
            Category::Nature => "nature",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Culture => "Culture",
            Category::Futuristic => "Futuristic",
            Category::KidFriendly => "Kid-friendly",
            Category::Shopping => "Shopping",
            Category::Nature => "Nature",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Food => "🍽️",
            Category::Culture => "⛩️",
            Category::Futuristic => "🤖",
            Category::KidFriendly => "🎮",
            Category::Shopping => "🛍️",
            Category::Nature => "🌿",
        }
    }

    /// Marker color used by the map layer
    pub fn color(&self) -> &'static str {
        match self {
            Category::Food => "#F59E0B",
            Category::Culture => "#E63946",
            Category::Futuristic => "#8B5CF6",
            Category::KidFriendly => "#3B82F6",
            Category::Shopping => "#EC4899",
            Category::Nature => "#10B981",
        }
    }
}

impl FromStr for Category {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food" => Ok(Category::Food),
            "culture" => Ok(Category::Culture),
            "futuristic" => Ok(Category::Futuristic),
            "kid-friendly" => Ok(Category::KidFriendly),
            "shopping" => Ok(Category::Shopping),
            "nature" => Ok(Category::Nature),
            other => Err(TripError::InvalidInput(format!("unknown category '{}'", other))),
        }
    }
}

sql_text_enum!(Category);

/// Where a place record came from. Preset rows are replaced wholesale on reseed,
/// user rows are permanent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Preset,
    User,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Preset => "preset",
            Provenance::User => "user",
        }
    }
}

impl FromStr for Provenance {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preset" => Ok(Provenance::Preset),
            "user" => Ok(Provenance::User),
            other => Err(TripError::InvalidInput(format!("unknown provenance '{}'", other))),
        }
    }
}

sql_text_enum!(Provenance);

/// A point of interest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_ja: Option<String>,
    pub category: Category,
    pub neighborhood: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub member_fit: Vec<String>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default = "default_place_emoji")]
    pub image_emoji: String,
    #[serde(default, rename = "source")]
    pub source: Provenance,
}

fn default_place_emoji() -> String {
    "📍".to_string()
}

impl Place {
    /// Create a user-provenance place (custom activity flow)
    pub fn user(id: &str, name: &str, category: Category, neighborhood: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            name_ja: None,
            category,
            neighborhood: neighborhood.to_string(),
            lat,
            lng,
            notes: None,
            price_range: None,
            duration: None,
            hours: None,
            tags: Vec::new(),
            member_fit: Vec::new(),
            priority: false,
            image_emoji: default_place_emoji(),
            source: Provenance::User,
        }
    }

    /// Logistics entries (flights, transfers) that are not physical destinations
    pub fn is_transit(&self) -> bool {
        self.neighborhood == TRANSIT_NEIGHBORHOOD
    }

    pub fn is_booked(&self) -> bool {
        self.price_range
            .as_deref()
            .map_or(false, |p| p.eq_ignore_ascii_case(BOOKED_PRICE_RANGE))
    }

    pub fn fits_member(&self, member_id: &str) -> bool {
        self.member_fit.iter().any(|m| m == member_id)
    }

    /// Case-insensitive match across name, native-script name, neighborhood and tags
    pub fn matches_search(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&q)
            || self.name_ja.as_deref().map_or(false, |n| n.contains(query.trim()))
            || self.neighborhood.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

/// Filters shared by the browse, wishlist and nearby lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceFilter {
    pub category: Option<Category>,
    /// Family member id; None means everyone
    pub member: Option<String>,
    pub search: Option<String>,
}

impl PlaceFilter {
    pub fn matches(&self, place: &Place) -> bool {
        if let Some(category) = self.category {
            if place.category != category {
                return false;
            }
        }
        if let Some(ref member) = self.member {
            if !place.fits_member(member) {
                return false;
            }
        }
        match self.search {
            Some(ref q) => place.matches_search(q),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("museum".parse::<Category>().is_err());
    }

    #[test]
    fn test_place_json_uses_camel_case_and_defaults() {
        let json = r#"{
            "id": "a6", "name": "Akihabara", "nameJa": "秋葉原", "category": "kid-friendly",
            "neighborhood": "Akihabara", "lat": 35.6984, "lng": 139.7731,
            "memberFit": ["dad", "kid"], "priority": true
        }"#;
        let place: Place = serde_json::from_str(json).unwrap();
        assert_eq!(place.category, Category::KidFriendly);
        assert_eq!(place.source, Provenance::Preset);
        assert_eq!(place.image_emoji, "📍");
        assert!(place.fits_member("kid"));
        assert!(!place.fits_member("mom"));
    }

    #[test]
    fn test_search_matches_tags_and_native_name() {
        let mut place = Place::user("u1", "Ramen Street", Category::Food, "Marunouchi", 35.68, 139.76);
        place.name_ja = Some("ラーメンストリート".to_string());
        place.tags = vec!["Noodles".to_string()];

        assert!(place.matches_search("noodle"));
        assert!(place.matches_search("ラーメン"));
        assert!(place.matches_search("maru"));
        assert!(!place.matches_search("sushi"));
    }

    #[test]
    fn test_sentinels() {
        let mut place = Place::user("t9", "Flight", Category::Culture, TRANSIT_NEIGHBORHOOD, 0.0, 0.0);
        place.price_range = Some("Booked".to_string());
        assert!(place.is_transit());
        assert!(place.is_booked());
    }
}
