// Backup export for Trip Planner
// Serializes every user-authored record into one JSON document

use std::path::{Path, PathBuf};

use super::models::{BackupDocument, Provenance, BACKUP_FILE_NAME};
use super::places_repo::PlaceQuery;
use super::DatabaseManager;
use crate::error::Result;

impl DatabaseManager {
    /// Snapshot of user places, itinerary, wishlist and members
    pub fn export_backup(&self) -> Result<BackupDocument> {
        Ok(BackupDocument {
            places: self.query_places(&PlaceQuery::source(Provenance::User))?,
            itinerary: self.get_all_itinerary()?,
            wishlist: self.get_all_wishlist()?,
            members: self.get_all_members()?,
            export_date: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Write the backup as pretty JSON into `dir`, returning the file path
    pub fn write_backup(&self, dir: &Path) -> Result<PathBuf> {
        let backup = self.export_backup()?;
        let path = dir.join(BACKUP_FILE_NAME);

        std::fs::create_dir_all(dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(&backup)?)?;

        log::info!(
            "Backup written to {:?} ({} places, {} itinerary items, {} wishlist items)",
            path,
            backup.places.len(),
            backup.itinerary.len(),
            backup.wishlist.len()
        );
        Ok(path)
    }
}
