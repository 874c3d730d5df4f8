// Database models - Family members
use serde::{Deserialize, Serialize};

/// A family member; `active` acts as a cross-view filter toggle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FamilyMember {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub active: bool,
}

impl FamilyMember {
    pub fn new(id: &str, name: &str, emoji: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            active: true,
        }
    }

    /// Short interest summary shown on the profile screen
    pub fn summary(&self) -> &'static str {
        match self.id.as_str() {
            "dad" => "Tech, photography, ramen, retro games",
            "mom" => "Culture, shopping, gardens, good food",
            "kid" => "Pokemon, arcades, theme parks, karting",
            _ => "",
        }
    }
}

/// Partial update for a family member
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub active: Option<bool>,
}
