//! Dense competition ranking.

use std::collections::HashMap;

use crate::models::{Ranked, Tally};

/// Assign dense ranks by count.
///
/// Distinct counts are ordered descending and numbered from 1; every record
/// sharing a count shares its rank, and the next distinct count advances the
/// rank by exactly one. `rank_total_count` is the number of distinct counts.
/// Every record gets `comp_total_count`.
pub fn assign_dense_ranks<T: Ranked>(records: &mut [T], comp_total_count: i64) {
    let mut distinct: Vec<u32> = records.iter().map(Tally::count).collect();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();

    let rank_total_count = distinct.len() as i64;
    let rank_of: HashMap<u32, i64> = distinct
        .iter()
        .enumerate()
        .map(|(i, &count)| (count, i as i64 + 1))
        .collect();

    for record in records.iter_mut() {
        let rank = rank_of.get(&record.count()).copied().unwrap_or(rank_total_count);
        let ranking = record.ranking_mut();
        ranking.rank = rank;
        ranking.rank_total_count = rank_total_count;
        ranking.comp_total_count = comp_total_count;
    }
}

/// Number of compositions behind a table: four top-4 boards per match.
pub fn comp_total_count(match_count: usize) -> i64 {
    match_count as i64 * 4
}
