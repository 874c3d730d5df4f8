// Bundled seed data for Trip Planner
// The reference documents are compiled into the binary so a first run works offline

use async_trait::async_trait;
use serde_json::Value;

use super::source::{SeedSource, ATTRACTIONS, MT_FUJI, NEIGHBORHOODS, RESTAURANTS};
use crate::database::FamilyMember;
use crate::error::{Result, TripError};

const ATTRACTIONS_JSON: &str = include_str!("../../data/attractions.json");
const RESTAURANTS_JSON: &str = include_str!("../../data/restaurants.json");
const MT_FUJI_JSON: &str = include_str!("../../data/mt-fuji.json");
const NEIGHBORHOODS_JSON: &str = include_str!("../../data/neighborhoods.json");
const SEED_ITINERARY_JSON: &str = include_str!("../../data/seed_itinerary.json");

/// Serves the documents compiled in from `data/`
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSeedSource;

#[async_trait]
impl SeedSource for BundledSeedSource {
    async fn load_document(&self, name: &str) -> Result<Value> {
        let raw = match name {
            ATTRACTIONS => ATTRACTIONS_JSON,
            RESTAURANTS => RESTAURANTS_JSON,
            MT_FUJI => MT_FUJI_JSON,
            NEIGHBORHOODS => NEIGHBORHOODS_JSON,
            other => return Err(TripError::seed_source(other, "no bundled document by that name")),
        };
        serde_json::from_str(raw).map_err(|e| TripError::seed_source(name, e))
    }

    fn describe(&self) -> String {
        "bundled data".to_string()
    }
}

/// The three family members, all active
pub fn default_members() -> Vec<FamilyMember> {
    vec![
        FamilyMember::new("dad", "Dad", "👨"),
        FamilyMember::new("mom", "Mom", "👩"),
        FamilyMember::new("kid", "Kid", "👦"),
    ]
}

/// Raw records of the bundled itinerary (stable ids `itin-d<day>-s<n>`)
pub fn seed_itinerary_records() -> Result<Vec<Value>> {
    serde_json::from_str(SEED_ITINERARY_JSON).map_err(|e| TripError::seed_source("seed_itinerary", e))
}
