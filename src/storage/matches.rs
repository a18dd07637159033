//! Match batch storage.
//!
//! Each ingestion run writes its matches into one timestamped batch
//! directory per (version, region, league). Match files are immutable: a
//! file that already exists is never overwritten. Batches are read newest
//! first; a match id already seen in a newer batch is deleted from the older
//! one, and batches past the read window are evicted.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::{list_dir_names, StorageConfig, StorageError};
use crate::models::{League, Match, Region};

/// Batch identifier: milliseconds since the Unix epoch at the start of the
/// ingestion run.
pub type BatchId = i64;

/// The (version, region, league) a batch belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub version: String,
    pub region: Region,
    pub league: League,
}

impl BatchKey {
    pub fn new(version: impl Into<String>, region: Region, league: League) -> Self {
        Self {
            version: version.into(),
            region,
            league,
        }
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.version, self.region, self.league)
    }
}

/// Outcome of [`MatchStore::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    AlreadyExists,
}

/// Matches read from one batch.
#[derive(Debug, Default)]
pub struct BatchContents {
    pub matches: Vec<Match>,
    pub duplicates_removed: usize,
}

/// Result of a capped newest-first read.
#[derive(Debug, Default)]
pub struct RecentMatches {
    pub matches: Vec<Match>,
    /// Batches read, newest first.
    pub batches_read: Vec<BatchId>,
    /// Batches deleted because they fell outside the read window.
    pub evicted: Vec<BatchId>,
    pub duplicates_removed: usize,
}

/// Per-match JSON files under `matches/`.
#[derive(Debug, Clone)]
pub struct MatchStore {
    root: PathBuf,
}

impl MatchStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.matches_dir(),
        }
    }

    pub fn league_dir(&self, key: &BatchKey) -> PathBuf {
        self.root
            .join(&key.version)
            .join(key.region.as_str())
            .join(key.league.as_str())
    }

    pub fn batch_dir(&self, key: &BatchKey, batch: BatchId) -> PathBuf {
        self.league_dir(key).join(batch.to_string())
    }

    pub fn match_path(&self, key: &BatchKey, batch: BatchId, match_id: &str) -> PathBuf {
        self.batch_dir(key, batch).join(format!("{}.json", match_id))
    }

    /// Whether `match_id` is already stored in `batch`.
    pub fn contains(&self, key: &BatchKey, batch: BatchId, match_id: &str) -> bool {
        self.match_path(key, batch, match_id).exists()
    }

    /// Write a match into a batch unless a file with its id already exists.
    pub fn persist(
        &self,
        m: &Match,
        key: &BatchKey,
        batch: BatchId,
    ) -> Result<PersistOutcome, StorageError> {
        let match_id = m.match_id().ok_or(StorageError::MissingMatchId)?;
        let path = self.match_path(key, batch, match_id);

        if path.exists() {
            debug!("{:?} already exists, leaving it untouched", path);
            return Ok(PersistOutcome::AlreadyExists);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(m)?;
        fs::write(&path, json)?;

        info!("Wrote match {:?}", path);
        Ok(PersistOutcome::Written)
    }

    /// Version directories, sorted by name.
    pub fn list_versions(&self) -> Result<Vec<String>, StorageError> {
        list_dir_names(&self.root)
    }

    /// Region directories of a version that name a known region.
    pub fn list_regions(&self, version: &str) -> Result<Vec<Region>, StorageError> {
        let names = list_dir_names(&self.root.join(version))?;
        Ok(names.iter().filter_map(|n| n.parse().ok()).collect())
    }

    /// League directories of a (version, region) that name a known league.
    pub fn list_leagues(&self, version: &str, region: Region) -> Result<Vec<League>, StorageError> {
        let names = list_dir_names(&self.root.join(version).join(region.as_str()))?;
        Ok(names.iter().filter_map(|n| n.parse().ok()).collect())
    }

    /// Batch ids of a key, newest first. Non-numeric entries are ignored.
    pub fn list_batches(&self, key: &BatchKey) -> Result<Vec<BatchId>, StorageError> {
        let mut batches: Vec<BatchId> = list_dir_names(&self.league_dir(key))?
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!("Ignoring non-batch entry {} under {}", name, key);
                    None
                }
            })
            .collect();

        batches.sort_unstable_by(|a, b| b.cmp(a));
        Ok(batches)
    }

    /// Read one batch. Files whose id is in `seen` were read from a newer
    /// batch in this pass; they are deleted and skipped. Ids read here are
    /// added to `seen`. Unparseable files are logged and skipped.
    pub fn read_batch(
        &self,
        key: &BatchKey,
        batch: BatchId,
        seen: &mut HashSet<String>,
    ) -> Result<BatchContents, StorageError> {
        let dir = self.batch_dir(key, batch);
        if !dir.exists() {
            return Err(StorageError::PathNotFound(dir));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut contents = BatchContents::default();
        for path in files {
            let Some(match_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };

            if seen.contains(&match_id) {
                fs::remove_file(&path)?;
                info!("Deleted duplicate match file {:?}", path);
                contents.duplicates_removed += 1;
                continue;
            }

            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<Match>(&text) {
                Ok(m) => {
                    seen.insert(match_id);
                    contents.matches.push(m);
                }
                Err(e) => {
                    warn!("Failed to parse match file {:?}: {}", path, e);
                }
            }
        }

        debug!(
            "Read {} matches from batch {} of {}",
            contents.matches.len(),
            batch,
            key
        );
        Ok(contents)
    }

    /// Delete every batch at or beyond position `from` in the newest-first
    /// ordering. Returns the deleted batch ids.
    pub fn evict_batches_from(
        &self,
        key: &BatchKey,
        from: usize,
    ) -> Result<Vec<BatchId>, StorageError> {
        let batches = self.list_batches(key)?;
        let stale: Vec<BatchId> = batches.into_iter().skip(from).collect();

        for batch in &stale {
            let dir = self.batch_dir(key, *batch);
            fs::remove_dir_all(&dir)?;
            info!("Removed old batch {:?}", dir);
        }

        Ok(stale)
    }

    /// Read batches newest first until at least `match_cap` matches are
    /// collected, finishing the batch in progress, then evict every batch
    /// after it. `max_batches` (0 = unbounded) also bounds the window.
    pub fn read_recent(
        &self,
        key: &BatchKey,
        match_cap: usize,
        max_batches: usize,
    ) -> Result<RecentMatches, StorageError> {
        let batches = self.list_batches(key)?;
        let window = if max_batches == 0 {
            batches.len()
        } else {
            batches.len().min(max_batches)
        };

        let mut seen = HashSet::new();
        let mut result = RecentMatches::default();

        for &batch in batches.iter().take(window) {
            info!("Reading batch {} of {}", batch, key);
            let contents = self.read_batch(key, batch, &mut seen)?;
            result.matches.extend(contents.matches);
            result.duplicates_removed += contents.duplicates_removed;
            result.batches_read.push(batch);

            if result.matches.len() >= match_cap {
                break;
            }
        }

        result.evicted = self.evict_batches_from(key, result.batches_read.len())?;
        Ok(result)
    }
}
