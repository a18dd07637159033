//! Ranked per-category tables over a set of matches.

use crate::models::{AugmentStats, Category, Match, TraitStats, UnitStats};

use super::merge::{merge_augments, merge_traits, merge_units, MergeOptions};
use super::rank::{assign_dense_ranks, comp_total_count};
use super::AggregateError;

/// A ranked table of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankedTable {
    Units(Vec<UnitStats>),
    Traits(Vec<TraitStats>),
    Augments(Vec<AugmentStats>),
}

impl RankedTable {
    pub fn category(&self) -> Category {
        match self {
            RankedTable::Units(_) => Category::Units,
            RankedTable::Traits(_) => Category::Traits,
            RankedTable::Augments(_) => Category::Augments,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RankedTable::Units(v) => v.len(),
            RankedTable::Traits(v) => v.len(),
            RankedTable::Augments(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merge every match's top-4 records of `category`, rank them densely by
/// count and stamp `comp_total_count = matches * 4`.
pub fn compute_category(
    matches: &[Match],
    category: Category,
    opts: &MergeOptions,
) -> Result<RankedTable, AggregateError> {
    let comp_total = comp_total_count(matches.len());

    let table = match category {
        Category::Units => {
            let records = matches
                .iter()
                .flat_map(|m| m.top4.units.iter().cloned())
                .collect();
            let mut table = merge_units(records, opts);
            assign_dense_ranks(&mut table, comp_total);
            RankedTable::Units(table)
        }
        Category::Traits => {
            let records = matches
                .iter()
                .flat_map(|m| m.top4.traits.iter().cloned())
                .collect();
            let mut table = merge_traits(records, opts)?;
            assign_dense_ranks(&mut table, comp_total);
            RankedTable::Traits(table)
        }
        Category::Augments => {
            let records = matches
                .iter()
                .flat_map(|m| m.top4.augments.iter().cloned())
                .collect();
            let mut table = merge_augments(records, opts);
            assign_dense_ranks(&mut table, comp_total);
            RankedTable::Augments(table)
        }
    };

    Ok(table)
}
