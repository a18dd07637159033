//! Run orchestration.
//!
//! Coordinates the pipeline:
//! 1. Collect: sample ranked players, fetch their recent matches, persist
//!    each new match into the run's batch
//! 2. Aggregate: read recent batches per (version, region, league), compute
//!    the ranked tables, publish them and rebuild the params index

use thiserror::Error;

mod aggregate;
mod collect;

pub use aggregate::{AggregateReport, Aggregator};
pub use collect::{sample_players, CollectReport, Collector};

/// Errors that can occur during a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] crate::calculate::AggregateError),

    #[error("Malformed match payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("[{match_id}] no release version in {game_version:?}")]
    MalformedReleaseVersion {
        match_id: String,
        game_version: String,
    },
}

/// Milliseconds since the Unix epoch, used for batch ids and `lastUpdatedTS`.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
