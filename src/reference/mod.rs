//! Entity reference data.
//!
//! Names, icons and descriptions of units, traits and items are supplied by
//! an external collaborator as one JSON file per release version. The file is
//! indexed once at load time by a normalized identifier; the enrichment
//! transforms in [`enrich`] join it with published tables.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod enrich;

pub use enrich::{
    enrich_augments, enrich_traits, enrich_units, AugmentView, ItemView, TraitView, UnitView,
};

/// Errors that can occur while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reference data not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionRef {
    pub api_name: String,
    pub name: String,
    #[serde(default)]
    pub cost: u8,
    #[serde(default)]
    pub icon: String,
    /// Display names of the champion's traits.
    #[serde(default)]
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitEffect {
    pub min_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitRef {
    pub api_name: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub effects: Vec<TraitEffect>,
}

/// An item or augment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub api_name: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub desc: String,
    /// Component item ids.
    #[serde(default)]
    pub composition: Vec<String>,
    #[serde(default)]
    pub effects: HashMap<String, serde_json::Value>,
}

/// On-disk shape of a reference file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceFile {
    #[serde(default)]
    pub champions: Vec<ChampionRef>,
    #[serde(default)]
    pub traits: Vec<TraitRef>,
    #[serde(default)]
    pub items: Vec<ItemRef>,
}

/// What kind of entity a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Unit,
    Trait,
    Item,
    Augment,
    Effect,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Unit => "unit",
            EntityKind::Trait => "trait",
            EntityKind::Item => "item",
            EntityKind::Augment => "augment",
            EntityKind::Effect => "effect",
        };
        f.write_str(s)
    }
}

/// A lookup that found no reference entry, or found one inconsistent with the
/// statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingReference {
    pub kind: EntityKind,
    pub id: String,
    /// Where the lookup happened, e.g. the owning record's id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl MissingReference {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            context: None,
        }
    }

    pub fn within(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "no {} data for {} (in {})", self.kind, self.id, context),
            None => write!(f, "no {} data for {}", self.kind, self.id),
        }
    }
}

/// Lookup key: trimmed and ASCII lower-cased.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Indexed reference data for one release version.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    version: String,
    champions: HashMap<String, ChampionRef>,
    traits: HashMap<String, TraitRef>,
    items: HashMap<String, ItemRef>,
}

impl ReferenceData {
    pub fn from_file_data(version: impl Into<String>, file: ReferenceFile) -> Self {
        let index = |name: &str| normalize_id(name);
        Self {
            version: version.into(),
            champions: file
                .champions
                .into_iter()
                .map(|c| (index(&c.api_name), c))
                .collect(),
            traits: file
                .traits
                .into_iter()
                .map(|t| (index(&t.api_name), t))
                .collect(),
            items: file
                .items
                .into_iter()
                .map(|i| (index(&i.api_name), i))
                .collect(),
        }
    }

    /// Load and index the reference file at `path`.
    pub fn load(version: &str, path: &Path) -> Result<Self, ReferenceError> {
        if !path.exists() {
            return Err(ReferenceError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path)?;
        let file: ReferenceFile = serde_json::from_str(&text)?;
        let data = Self::from_file_data(version, file);

        debug!(
            "Loaded reference data for {}: {} champions, {} traits, {} items",
            version,
            data.champions.len(),
            data.traits.len(),
            data.items.len()
        );
        Ok(data)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn champion(&self, id: &str) -> Option<&ChampionRef> {
        self.champions.get(&normalize_id(id))
    }

    pub fn trait_ref(&self, id: &str) -> Option<&TraitRef> {
        self.traits.get(&normalize_id(id))
    }

    /// Items and augments share one table.
    pub fn item(&self, id: &str) -> Option<&ItemRef> {
        self.items.get(&normalize_id(id))
    }

    /// Traits whose display name is listed by the champion.
    pub fn champion_traits<'a>(&'a self, champion: &'a ChampionRef) -> impl Iterator<Item = &'a TraitRef> {
        let mut traits: Vec<&TraitRef> = self
            .traits
            .values()
            .filter(|t| champion.traits.iter().any(|name| name == &t.name))
            .collect();
        traits.sort_by(|a, b| a.name.cmp(&b.name));
        traits.into_iter()
    }

    /// Public URL of a game asset path such as `ASSETS/Maps/.../Icon.tex`.
    pub fn asset_url(&self, icon: &str) -> Option<String> {
        if icon.is_empty() {
            return None;
        }
        let path = icon
            .to_ascii_lowercase()
            .replace(".dds", ".png")
            .replace(".tex", ".png");
        Some(format!(
            "https://raw.communitydragon.org/{}/game/{}",
            self.version, path
        ))
    }
}
