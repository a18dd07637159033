//! Aggregation run.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::SyncError;
use crate::calculate::{compute_category, MergeOptions, RankedTable};
use crate::config::{AggregatorConfig, CollectorConfig};
use crate::models::{Category, League, Region, StatsDocument, StatsParams};
use crate::storage::{
    BatchKey, MatchStore, ParamsFilter, ParamsIndex, StatsStore, StorageConfig,
};

/// Result of an aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub tuples_aggregated: u32,
    pub documents_written: u32,
    /// Documents of tuples left with no stored matches.
    pub documents_removed: u32,
    pub matches_read: usize,
    pub batches_evicted: usize,
    pub duplicates_removed: usize,
    /// Entries in the rebuilt params index.
    pub params_indexed: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Rebuilds the published tables from stored batches.
pub struct Aggregator {
    matches: MatchStore,
    stats: StatsStore,
    params: ParamsIndex,
    filter: ParamsFilter,
    config: AggregatorConfig,
    options: MergeOptions,
}

impl Aggregator {
    pub fn new(storage: &StorageConfig, collector: &CollectorConfig, config: AggregatorConfig) -> Self {
        let filter = ParamsFilter {
            regions: collector.regions.iter().copied().collect(),
            leagues: collector.leagues.iter().copied().collect(),
            excluded_versions: collector.excluded_versions.iter().cloned().collect(),
        };

        Self {
            matches: MatchStore::new(storage),
            stats: StatsStore::new(storage),
            params: ParamsIndex::new(storage),
            filter,
            options: config.merge_options(),
            config,
        }
    }

    /// Aggregate every stored (version, region, league) and rebuild the
    /// params index. A failing tuple is recorded and the run continues.
    pub fn run(&self, last_updated_ts: i64) -> Result<AggregateReport, SyncError> {
        let start = Instant::now();
        let mut report = AggregateReport::default();

        for key in self.keys()? {
            match self.aggregate_key(&key, last_updated_ts, &mut report) {
                Ok(()) => report.tuples_aggregated += 1,
                Err(e) => {
                    error!("[{}] aggregation failed: {}", key, e);
                    report.errors.push(format!("{}: {}", key, e));
                    let stale = self.published(&key);
                    if !stale.is_empty() {
                        warn!(
                            "[{}] previous {} documents remain published",
                            key,
                            stale.join("/")
                        );
                    }
                }
            }
        }

        report.params_indexed = self.rebuild_params()?.len();
        report.duration = start.elapsed();

        info!(
            "Aggregation completed: {} tuples, {} documents, {} matches, {} batches evicted, {} errors in {:?}",
            report.tuples_aggregated,
            report.documents_written,
            report.matches_read,
            report.batches_evicted,
            report.errors.len(),
            report.duration
        );

        Ok(report)
    }

    /// Rewrite `params.json` from the published documents in scope.
    pub fn rebuild_params(&self) -> Result<Vec<StatsParams>, SyncError> {
        Ok(self.params.rebuild(&self.filter)?)
    }

    /// Stored (version, region, league) keys within the configured scope.
    fn keys(&self) -> Result<Vec<BatchKey>, SyncError> {
        let regions: &HashSet<Region> = &self.filter.regions;
        let leagues: &HashSet<League> = &self.filter.leagues;
        let mut keys = Vec::new();

        for version in self.matches.list_versions()? {
            if self.filter.excluded_versions.contains(&version) {
                debug!("Skipping excluded version {}", version);
                continue;
            }
            for region in self.matches.list_regions(&version)? {
                if !regions.contains(&region) {
                    continue;
                }
                for league in self.matches.list_leagues(&version, region)? {
                    if leagues.contains(&league) {
                        keys.push(BatchKey::new(version.clone(), region, league));
                    }
                }
            }
        }

        Ok(keys)
    }

    /// Read, compute all three tables, then publish them. Nothing is written
    /// for the key when any table fails.
    fn aggregate_key(
        &self,
        key: &BatchKey,
        last_updated_ts: i64,
        report: &mut AggregateReport,
    ) -> Result<(), SyncError> {
        let recent = self
            .matches
            .read_recent(key, self.config.match_cap, self.config.retained_batches)?;

        report.batches_evicted += recent.evicted.len();
        report.duplicates_removed += recent.duplicates_removed;

        if recent.matches.is_empty() {
            for category in Category::ALL {
                let params = StatsParams::new(key.version.clone(), key.region, key.league, category);
                if self.stats.remove(&params)? {
                    report.documents_removed += 1;
                }
            }
            info!("[{}] no stored matches, nothing to publish", key);
            return Ok(());
        }
        report.matches_read += recent.matches.len();

        let tables = Category::ALL
            .into_iter()
            .map(|category| compute_category(&recent.matches, category, &self.options))
            .collect::<Result<Vec<_>, _>>()?;

        let count = recent.matches.len();
        for table in tables {
            match table {
                RankedTable::Units(value) => {
                    self.publish(key, Category::Units, count, value, last_updated_ts)?
                }
                RankedTable::Traits(value) => {
                    self.publish(key, Category::Traits, count, value, last_updated_ts)?
                }
                RankedTable::Augments(value) => {
                    self.publish(key, Category::Augments, count, value, last_updated_ts)?
                }
            }
            report.documents_written += 1;
        }

        info!(
            "[{}] published {} matches from {} batches",
            key,
            count,
            recent.batches_read.len()
        );
        Ok(())
    }

    /// Categories with a document on disk for the key.
    fn published(&self, key: &BatchKey) -> Vec<&'static str> {
        Category::ALL
            .into_iter()
            .filter(|&category| {
                self.stats.exists(&StatsParams::new(
                    key.version.clone(),
                    key.region,
                    key.league,
                    category,
                ))
            })
            .map(|category| category.as_str())
            .collect()
    }

    fn publish<T: Serialize>(
        &self,
        key: &BatchKey,
        category: Category,
        count: usize,
        value: Vec<T>,
        last_updated_ts: i64,
    ) -> Result<(), SyncError> {
        let doc = StatsDocument {
            category,
            region: key.region,
            version: key.version.clone(),
            league: key.league,
            count,
            value,
            last_updated_ts,
        };
        self.stats.write(&doc)?;
        Ok(())
    }
}
