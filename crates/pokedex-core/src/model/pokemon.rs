// ── Catalog entity types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entity id (1-based, as numbered by the national dex).
pub type PokemonId = i64;

/// One row of a catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub id: PokemonId,
    pub name: String,
    /// Display name in the catalog's localized language.
    pub localized_name: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
}

/// Full record shown on the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: PokemonId,
    pub name: String,
    pub localized_name: Option<String>,
    pub height: f64,
    pub weight: f64,
    pub thumbnail_url: Option<String>,
    pub types: Vec<String>,
    pub stats: BaseStats,
    pub created_at: Option<DateTime<Utc>>,
}

impl Pokemon {
    pub fn summary(&self) -> PokemonSummary {
        PokemonSummary {
            id: self.id,
            name: self.name.clone(),
            localized_name: self.localized_name.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        }
    }
}
