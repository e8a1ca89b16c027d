//! The `Category` record and its deterministic colour palette.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque category identity.
pub type CategoryId = Uuid;

/// Glyph given to categories created from an unmatched name.
pub const DEFAULT_EMOJI: &str = "🧾";

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

const PALETTE: [&str; 8] = [
    "#4A5568", "#DD6B20", "#2B6CB0", "#D53F8C", "#805AD5", "#38A169", "#D69E2E", "#319795",
];

/// Pick a palette colour for `name`.
///
/// The index is the sum of the name's Unicode scalar values modulo the
/// palette size, so a given name always maps to the same colour.
///
/// ```
/// use voice_ledger::taxonomy::color_hex_for;
///
/// assert_eq!(color_hex_for("Food"), color_hex_for("Food"));
/// assert!(color_hex_for("Travel").starts_with('#'));
/// ```
pub fn color_hex_for(name: &str) -> &'static str {
    let sum: u64 = name.chars().map(|c| u64::from(c)).sum();
    PALETTE[(sum % PALETTE.len() as u64) as usize]
}

/// Key used for case-insensitive name matching.
pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A ledger category as known to the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Display name; matched case-insensitively.
    pub name: String,
    pub emoji: String,
    pub color_hex: String,
}

impl Category {
    /// A category with a fresh random id.
    pub fn new(name: impl Into<String>, emoji: impl Into<String>, color_hex: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            emoji: emoji.into(),
            color_hex: color_hex.into(),
        }
    }

    /// Build the category synthesized for an unmatched `name`.
    ///
    /// The id is a v5 UUID over the lower-cased name, and the colour comes
    /// from [`color_hex_for`], so synthesizing the same name twice yields an
    /// identical record.
    pub fn synthesized(name: &str, emoji: &str) -> Self {
        let name = name.trim();
        let key = format!("category/{}", name_key(name));
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()),
            name: name.to_string(),
            emoji: emoji.to_string(),
            color_hex: color_hex_for(name).to_string(),
        }
    }

    /// `true` when `name` equals this category's name ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        name_key(&self.name) == name_key(name)
    }

    /// `"<emoji> <name>"`, as shown next to a draft.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}
