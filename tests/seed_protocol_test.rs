//! Seed protocol against a real database file
//!
//! Covers the retry path: a run with a malformed record must not advance the
//! version marker, and the next run with good data converges to the full set.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use trip_planner::database::{Category, Collection, DatabaseManager, Place, Provenance, SEED_VERSION_KEY};
use trip_planner::seed::{self, source::ATTRACTIONS, BundledSeedSource, SeedOutcome, SeedSource};
use trip_planner::Result;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Bundled documents with one unparseable attraction appended
struct OneBadRecord;

#[async_trait]
impl SeedSource for OneBadRecord {
    async fn load_document(&self, name: &str) -> Result<Value> {
        let mut doc = BundledSeedSource.load_document(name).await?;
        if name == ATTRACTIONS {
            if let Some(records) = doc.as_array_mut() {
                records.push(json!({ "id": "broken", "name": "No category" }));
            }
        }
        Ok(doc)
    }

    fn describe(&self) -> String {
        "bundled data plus one bad record".to_string()
    }
}

fn open(dir: &TempDir) -> DatabaseManager {
    DatabaseManager::open(dir.path().join("trip.db")).unwrap()
}

#[tokio::test]
async fn test_partial_failure_is_retried_on_next_start() {
    let dir = TempDir::new().unwrap();

    {
        let db = open(&dir);
        let outcome = seed::seed_database(&db, &OneBadRecord, TIMEOUT).await.unwrap();
        let SeedOutcome::Seeded(report) = outcome else {
            panic!("expected a seed run");
        };
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record, "No category");
        assert!(db.get_setting(SEED_VERSION_KEY).unwrap().is_none());
        // Good records of the failed run are already in place
        assert!(db.get_place("a1").unwrap().is_some());
    }

    // Next start, fixed source
    let db = open(&dir);
    let outcome = seed::seed_database(&db, &BundledSeedSource, TIMEOUT).await.unwrap();
    let SeedOutcome::Seeded(report) = outcome else {
        panic!("expected the failed version to be retried");
    };
    assert!(report.is_complete());
    assert_eq!(db.get_i64_setting(SEED_VERSION_KEY).unwrap(), Some(seed::SEED_VERSION));
    assert!(db.get_place("broken").unwrap().is_none());
    let bundled = seed::source::load_seed_documents(&BundledSeedSource, TIMEOUT).await.unwrap();
    assert_eq!(db.count(Collection::Places).unwrap(), bundled.places.len() as i64);

    let outcome = seed::seed_database(&db, &BundledSeedSource, TIMEOUT).await.unwrap();
    assert!(matches!(outcome, SeedOutcome::AlreadyCurrent { .. }));
}

#[tokio::test]
async fn test_repeated_seeding_converges() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    seed::seed_database_to(&db, &BundledSeedSource, TIMEOUT, 1).await.unwrap();
    let places = db.count(Collection::Places).unwrap();
    let itinerary = db.count(Collection::Itinerary).unwrap();

    // A version bump reseeds into the same state
    seed::seed_database_to(&db, &BundledSeedSource, TIMEOUT, 2).await.unwrap();
    assert_eq!(db.count(Collection::Places).unwrap(), places);
    assert_eq!(db.count(Collection::Itinerary).unwrap(), itinerary);
    assert_eq!(db.count(Collection::Members).unwrap(), 3);
}

#[tokio::test]
async fn test_reseed_preserves_user_data() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed::seed_database_to(&db, &BundledSeedSource, TIMEOUT, 1).await.unwrap();

    let custom = Place::user("user-1", "Grandma's favourite cafe", Category::Food, "Yanaka", 35.726, 139.767);
    db.upsert_place(&custom).unwrap();
    let teamlab = db.get_place("a4").unwrap().unwrap();
    let wish = db
        .insert_wishlist_item(&trip_planner::database::NewWishlistItem::from_place(&teamlab))
        .unwrap();

    seed::seed_database_to(&db, &BundledSeedSource, TIMEOUT, 2).await.unwrap();

    let kept = db.get_place("user-1").unwrap().unwrap();
    assert_eq!(kept.source, Provenance::User);
    assert!(db.get_wishlist_item(&wish.id).unwrap().is_some());
}
