//! Filesystem data lake operations.
//!
//! Handles reading and writing to the local data lake:
//! - Match batches (`matches/{version}/{region}/{league}/{batch}/{match_id}.json`)
//! - Published statistics (`stats/{version}/{region}/{league}/{category}.json`)
//! - The discovery list of published documents (`params.json`)
//! - Entity metadata per version (`reference/{version}.json`), read only

use std::path::PathBuf;
use thiserror::Error;

mod matches;
mod params;
mod stats;

pub use matches::*;
pub use params::*;
pub use stats::*;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Match has no identifier")]
    MissingMatchId,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn matches_dir(&self) -> PathBuf {
        self.data_dir.join("matches")
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.data_dir.join("stats")
    }

    pub fn params_path(&self) -> PathBuf {
        self.data_dir.join("params.json")
    }

    /// Entity metadata for one release version.
    pub fn reference_path(&self, version: &str) -> PathBuf {
        self.data_dir.join("reference").join(format!("{}.json", version))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Names of the subdirectories of `dir`, sorted. A missing directory is empty.
pub(crate) fn list_dir_names(dir: &std::path::Path) -> Result<Vec<String>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.matches_dir(), PathBuf::from("/data/matches"));
        assert_eq!(config.stats_dir(), PathBuf::from("/data/stats"));
        assert_eq!(config.params_path(), PathBuf::from("/data/params.json"));
        assert_eq!(
            config.reference_path("13.12"),
            PathBuf::from("/data/reference/13.12.json")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_list_dir_names_skips_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("b")).unwrap();
        std::fs::create_dir(temp_dir.path().join("a")).unwrap();
        std::fs::write(temp_dir.path().join(".DS_Store"), "").unwrap();

        let names = list_dir_names(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_dir_names_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let names = list_dir_names(&temp_dir.path().join("missing")).unwrap();
        assert!(names.is_empty());
    }
}
