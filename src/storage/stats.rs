//! Published statistics documents.

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::{list_dir_names, StorageConfig, StorageError};
use crate::models::{Category, StatsDocument, StatsParams};

/// One JSON document per (version, region, league, category) under `stats/`.
#[derive(Debug, Clone)]
pub struct StatsStore {
    root: PathBuf,
}

impl StatsStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.stats_dir(),
        }
    }

    pub fn path(&self, params: &StatsParams) -> PathBuf {
        self.root
            .join(&params.version)
            .join(params.region.as_str())
            .join(params.league.as_str())
            .join(params.category.file_name())
    }

    pub fn exists(&self, params: &StatsParams) -> bool {
        self.path(params).exists()
    }

    /// Write (replace) the document for its params.
    pub fn write<T: Serialize>(&self, doc: &StatsDocument<T>) -> Result<PathBuf, StorageError> {
        let path = self.path(&doc.params());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&path, json)?;

        info!("Wrote {} {} entries to {:?}", doc.value.len(), doc.category, path);
        Ok(path)
    }

    /// Delete a published document. Returns whether one existed.
    pub fn remove(&self, params: &StatsParams) -> Result<bool, StorageError> {
        let path = self.path(params);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)?;
        info!("Removed {:?}", path);
        Ok(true)
    }

    pub fn read<T: DeserializeOwned>(
        &self,
        params: &StatsParams,
    ) -> Result<StatsDocument<T>, StorageError> {
        let path = self.path(params);
        if !path.exists() {
            return Err(StorageError::PathNotFound(path));
        }

        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Raw JSON text of a document, for serving without re-typing.
    pub fn read_raw(&self, params: &StatsParams) -> Result<serde_json::Value, StorageError> {
        let path = self.path(params);
        if !path.exists() {
            return Err(StorageError::PathNotFound(path));
        }

        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Every published document whose path components name a known region,
    /// league and category. Unsorted; stray entries are ignored.
    pub fn list_published(&self) -> Result<Vec<StatsParams>, StorageError> {
        let mut found = Vec::new();

        for version in list_dir_names(&self.root)? {
            let version_dir = self.root.join(&version);
            for region_name in list_dir_names(&version_dir)? {
                let Ok(region) = region_name.parse() else {
                    continue;
                };
                let region_dir = version_dir.join(&region_name);
                for league_name in list_dir_names(&region_dir)? {
                    let Ok(league) = league_name.parse() else {
                        continue;
                    };
                    let league_dir = region_dir.join(&league_name);
                    for category in Category::ALL {
                        if league_dir.join(category.file_name()).is_file() {
                            found.push(StatsParams::new(version.clone(), region, league, category));
                        }
                    }
                }
            }
        }

        Ok(found)
    }
}
