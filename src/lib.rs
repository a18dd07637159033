//! # top4-stats
//!
//! Rate-limited TFT match ingestion and top-4 frequency statistics.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (regions, leagues, matches, stat records)
//! - **fetch**: Rate-limited upstream client and typed endpoints
//! - **storage**: Filesystem data lake (match batches, published documents, params)
//! - **calculate**: Top-4 derivation, merging and dense ranking
//! - **sync**: Collection and aggregation runs
//! - **reference**: Entity metadata lookup and enrichment
//! - **api**: Read-only REST API
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod reference;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly run interval (e.g., "1d", "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 86_400)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}
