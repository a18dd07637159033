//! Statistics calculation engine.
//!
//! Computes the published top-4 tables from stored matches:
//! - Generic group-sum-rank aggregation by identity
//! - Per-category merge strategies with nested neighbor aggregation
//! - Dense ranking
//! - Per-match top-4 derivation at ingestion time

use thiserror::Error;

pub mod frequency;
pub mod merge;
pub mod rank;
pub mod table;
pub mod top4;

pub use frequency::{aggregate, aggregate_counts, try_aggregate};
pub use merge::MergeOptions;
pub use rank::assign_dense_ranks;
pub use table::{compute_category, RankedTable};
pub use top4::derive_top4;

/// Errors raised while aggregating records.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Inconsistent {field} in group {id}: expected {expected}, found {found}")]
    InconsistentGroup {
        id: String,
        field: &'static str,
        expected: String,
        found: String,
    },
}
