//! Seed and upgrade of preset reference data
//!
//! Runs on every start. When the stored `seedVersion` setting is at least
//! `SEED_VERSION` nothing happens. Otherwise preset places and the itinerary
//! are replaced from the seed documents, default members are upserted, the
//! auxiliary settings are written, and the version marker is written last.
//! Every write is an upsert or a delete-by-filter, so a run that fails part
//! way can simply be repeated on the next start.

pub mod defaults;
pub mod source;

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::database::{
    Collection, DatabaseManager, ItineraryItem, Place, Provenance, DB_SEEDED_KEY, GPS_ENABLED_KEY,
    NEIGHBORHOODS_KEY, SEED_VERSION_KEY,
};
use crate::error::Result;

pub use defaults::{default_members, BundledSeedSource};
pub use source::{DirectorySeedSource, HttpSeedSource, SeedDocuments, SeedSource};

/// Version of the bundled reference dataset. Bump to force a reseed.
pub const SEED_VERSION: i64 = 14;

/// Default bound on loading the seed documents
pub const DEFAULT_SEED_TIMEOUT: Duration = Duration::from_secs(15);

/// A record that could not be written during a seed run
#[derive(Debug, Clone, Serialize)]
pub struct SeedFailure {
    pub collection: &'static str,
    /// Identifying name of the record (name, custom name or id)
    pub record: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub version: i64,
    pub places: usize,
    pub itinerary: usize,
    pub members: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    /// Whether the version marker was advanced
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SeedOutcome {
    AlreadyCurrent { version: i64 },
    Seeded(SeedReport),
}

/// Seed against the bundled `SEED_VERSION`
pub async fn seed_database(
    db: &DatabaseManager,
    source: &dyn SeedSource,
    timeout: Duration,
) -> Result<SeedOutcome> {
    seed_database_to(db, source, timeout, SEED_VERSION).await
}

/// Seed against an explicit dataset version
pub async fn seed_database_to(
    db: &DatabaseManager,
    source: &dyn SeedSource,
    timeout: Duration,
    version: i64,
) -> Result<SeedOutcome> {
    let current = db.get_i64_setting(SEED_VERSION_KEY)?;
    if let Some(current) = current {
        if current >= version {
            log::debug!("Seed data current (v{})", current);
            return Ok(SeedOutcome::AlreadyCurrent { version: current });
        }
    }

    log::info!("Seeding database (v{}) from {}...", version, source.describe());

    // Scoped reset: user places and wishlist survive
    let removed = db.delete_places_by_source(Provenance::Preset)?;
    db.clear(Collection::Itinerary)?;
    log::debug!("Removed {} preset places and cleared the itinerary", removed);

    let documents = source::load_seed_documents(source, timeout).await?;

    let mut report = SeedReport {
        version,
        ..Default::default()
    };

    for record in documents.places {
        let label = record_label(&record);
        let written = serde_json::from_value::<Place>(record)
            .map_err(Into::into)
            .and_then(|mut place| {
                place.source = Provenance::Preset;
                db.upsert_place(&place)
            });
        match written {
            Ok(()) => report.places += 1,
            Err(e) => {
                log::error!("Failed to seed place '{}': {}", label, e);
                report.failures.push(SeedFailure {
                    collection: "places",
                    record: label,
                    message: e.to_string(),
                });
            }
        }
    }

    for member in default_members() {
        match db.upsert_member_keep_active(&member) {
            Ok(()) => report.members += 1,
            Err(e) => {
                log::error!("Failed to seed member '{}': {}", member.name, e);
                report.failures.push(SeedFailure {
                    collection: "members",
                    record: member.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    for record in defaults::seed_itinerary_records()? {
        let label = record_label(&record);
        let written = serde_json::from_value::<ItineraryItem>(record)
            .map_err(Into::into)
            .and_then(|item| db.upsert_itinerary_item(&item));
        match written {
            Ok(()) => report.itinerary += 1,
            Err(e) => {
                log::error!("Failed to seed itinerary item '{}': {}", label, e);
                report.failures.push(SeedFailure {
                    collection: "itinerary",
                    record: label,
                    message: e.to_string(),
                });
            }
        }
    }

    db.set_setting(NEIGHBORHOODS_KEY, &documents.neighborhoods)?;
    db.set_bool_setting(DB_SEEDED_KEY, true)?;
    db.set_bool_setting(GPS_ENABLED_KEY, true)?;

    if report.is_complete() {
        // Must stay the final write of the run
        db.set_setting(SEED_VERSION_KEY, &Value::from(version))?;
        log::info!(
            "Database seeded: {} places, {} itinerary items",
            report.places,
            report.itinerary
        );
    } else {
        log::warn!(
            "Seed v{} incomplete: {} records failed, version marker not advanced",
            version,
            report.failures.len()
        );
    }

    Ok(SeedOutcome::Seeded(report))
}

/// Best identifying name for a raw seed record
fn record_label(record: &Value) -> String {
    ["name", "customName", "id"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or("<unnamed>")
        .to_string()
}
