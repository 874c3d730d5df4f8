// Database models - Backup export
use serde::{Deserialize, Serialize};

use super::{FamilyMember, ItineraryItem, Place, WishlistItem};

/// Default file name offered for a backup download
pub const BACKUP_FILE_NAME: &str = "tokyo-trip-backup.json";

/// Everything the user authored, in one document.
/// Preset places are left out since a reseed restores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub places: Vec<Place>,
    pub itinerary: Vec<ItineraryItem>,
    pub wishlist: Vec<WishlistItem>,
    pub members: Vec<FamilyMember>,
    pub export_date: String,
}
