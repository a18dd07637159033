//! Per-category merge strategies.
//!
//! Each strategy aggregates top-level records by id and, inside the merge
//! step, aggregates the nested neighbor, star level and item collections of
//! the group. The same strategies serve the per-match pre-aggregation (no
//! limits) and the published tables (limits and filters applied).

use crate::models::{
    AugmentStats, CountEntry, Ranking, Tally, TraitNeighbor, TraitStats, UnitNeighbor, UnitStats,
    EMPTY_BAG_ITEM,
};

use super::frequency::{aggregate, aggregate_counts, try_aggregate};
use super::AggregateError;

/// Limits and filters applied while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    /// Neighbors kept per record, `None` for all.
    pub neighbor_limit: Option<usize>,
    /// Items kept per unit, `None` for all.
    pub item_limit: Option<usize>,
    /// Drop the empty-bag placeholder from top-level unit items.
    pub drop_empty_bag: bool,
    /// Drop inactive (`style == 0`) traits and trait neighbors.
    pub active_traits_only: bool,
}

impl MergeOptions {
    /// No limits, no filters.
    pub const PER_MATCH: MergeOptions = MergeOptions {
        neighbor_limit: None,
        item_limit: None,
        drop_empty_bag: false,
        active_traits_only: false,
    };

    /// Options for published tables.
    pub fn published(neighbor_limit: usize, item_limit: usize) -> Self {
        Self {
            neighbor_limit: Some(neighbor_limit),
            item_limit: Some(item_limit),
            drop_empty_bag: true,
            active_traits_only: true,
        }
    }
}

pub fn merge_units(records: Vec<UnitStats>, opts: &MergeOptions) -> Vec<UnitStats> {
    aggregate(
        records,
        |group, seed| {
            let mut tiers = Vec::new();
            let mut items = Vec::new();
            let mut neighbors = Vec::new();
            for unit in group {
                tiers.extend(unit.tiers);
                items.extend(unit.items);
                neighbors.extend(unit.neighbors);
            }
            if opts.drop_empty_bag {
                items.retain(|item| item.id != EMPTY_BAG_ITEM);
            }

            UnitStats {
                id: seed.id,
                count: seed.count,
                tiers: aggregate_counts(tiers, None),
                items: aggregate_counts(items, opts.item_limit),
                neighbors: merge_unit_neighbors(neighbors, opts),
                ranking: Ranking::UNRANKED,
            }
        },
        None,
    )
}

fn merge_unit_neighbors(neighbors: Vec<UnitNeighbor>, opts: &MergeOptions) -> Vec<UnitNeighbor> {
    aggregate(
        neighbors,
        |group, seed| {
            let mut tiers = Vec::new();
            let mut items = Vec::new();
            for unit in group {
                tiers.extend(unit.tiers);
                items.extend(unit.items);
            }
            UnitNeighbor {
                id: seed.id,
                count: seed.count,
                tiers: aggregate_counts(tiers, None),
                items: aggregate_counts(items, opts.item_limit),
            }
        },
        opts.neighbor_limit,
    )
}

/// Fields every member of a trait group must agree on.
trait TraitShape: Tally<Id = String> {
    fn name(&self) -> &str;
    fn style(&self) -> u8;
    fn tier_current(&self) -> u8;
    fn tier_total(&self) -> u8;
}

macro_rules! impl_trait_shape {
    ($($ty:ty),*) => {
        $(
            impl TraitShape for $ty {
                fn name(&self) -> &str {
                    &self.name
                }

                fn style(&self) -> u8 {
                    self.style
                }

                fn tier_current(&self) -> u8 {
                    self.tier_current
                }

                fn tier_total(&self) -> u8 {
                    self.tier_total
                }
            }
        )*
    };
}

impl_trait_shape!(TraitStats, TraitNeighbor);

fn check_trait_group<T: TraitShape>(group: &[T]) -> Result<(), AggregateError> {
    let Some((first, rest)) = group.split_first() else {
        return Ok(());
    };
    for member in rest {
        let mismatch = if member.name() != first.name() {
            Some(("name", first.name().to_string(), member.name().to_string()))
        } else if member.style() != first.style() {
            Some(("style", first.style().to_string(), member.style().to_string()))
        } else if member.tier_current() != first.tier_current() {
            Some((
                "tierCurrent",
                first.tier_current().to_string(),
                member.tier_current().to_string(),
            ))
        } else if member.tier_total() != first.tier_total() {
            Some((
                "tierTotal",
                first.tier_total().to_string(),
                member.tier_total().to_string(),
            ))
        } else {
            None
        };

        if let Some((field, expected, found)) = mismatch {
            return Err(AggregateError::InconsistentGroup {
                id: first.id().clone(),
                field,
                expected,
                found,
            });
        }
    }
    Ok(())
}

pub fn merge_traits(
    records: Vec<TraitStats>,
    opts: &MergeOptions,
) -> Result<Vec<TraitStats>, AggregateError> {
    let records = records
        .into_iter()
        .filter(|t| !opts.active_traits_only || t.style > 0);

    try_aggregate(
        records,
        |group, seed| {
            check_trait_group(&group)?;
            let first = &group[0];
            let (name, style, tier_current, tier_total) =
                (first.name.clone(), first.style, first.tier_current, first.tier_total);

            let neighbors = group
                .into_iter()
                .flat_map(|t| t.neighbors)
                .filter(|n| !opts.active_traits_only || n.style > 0);

            let neighbors = try_aggregate(
                neighbors,
                |group, seed| {
                    check_trait_group(&group)?;
                    let first = &group[0];
                    Ok(TraitNeighbor {
                        id: seed.id,
                        count: seed.count,
                        name: first.name.clone(),
                        style: first.style,
                        tier_current: first.tier_current,
                        tier_total: first.tier_total,
                    })
                },
                opts.neighbor_limit,
            )?;

            Ok(TraitStats {
                id: seed.id,
                count: seed.count,
                name,
                style,
                tier_current,
                tier_total,
                neighbors,
                ranking: Ranking::UNRANKED,
            })
        },
        None,
    )
}

pub fn merge_augments(records: Vec<AugmentStats>, opts: &MergeOptions) -> Vec<AugmentStats> {
    aggregate(
        records,
        |group, seed| {
            let neighbors: Vec<CountEntry<String>> =
                group.into_iter().flat_map(|a| a.neighbors).collect();
            AugmentStats {
                id: seed.id,
                count: seed.count,
                neighbors: aggregate_counts(neighbors, opts.neighbor_limit),
                ranking: Ranking::UNRANKED,
            }
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry<K>(id: K, count: u32) -> CountEntry<K> {
        CountEntry::new(id, count)
    }

    fn unit(id: &str, tier: u8, items: &[&str], neighbors: &[&str]) -> UnitStats {
        UnitStats {
            id: id.to_string(),
            count: 1,
            tiers: vec![entry(tier, 1)],
            items: items.iter().map(|i| entry(i.to_string(), 1)).collect(),
            neighbors: neighbors
                .iter()
                .map(|n| UnitNeighbor {
                    id: n.to_string(),
                    count: 1,
                    tiers: vec![entry(1, 1)],
                    items: vec![],
                })
                .collect(),
            ranking: Ranking::UNRANKED,
        }
    }

    fn trait_stats(name: &str, style: u8, tier_current: u8, neighbors: Vec<TraitNeighbor>) -> TraitStats {
        TraitStats {
            id: TraitStats::trait_id(name, style),
            count: 1,
            name: name.to_string(),
            style,
            tier_current,
            tier_total: 4,
            neighbors,
            ranking: Ranking::UNRANKED,
        }
    }

    fn trait_neighbor(name: &str, style: u8) -> TraitNeighbor {
        TraitNeighbor {
            id: TraitStats::trait_id(name, style),
            count: 1,
            name: name.to_string(),
            style,
            tier_current: style,
            tier_total: 4,
        }
    }

    #[test]
    fn test_merge_units_nests_neighbors_and_tiers() {
        let merged = merge_units(
            vec![
                unit("Ahri", 2, &["Rabadon"], &["Lux"]),
                unit("Ahri", 3, &["Rabadon", "Blue"], &["Lux", "Zed"]),
                unit("Lux", 1, &[], &["Ahri"]),
            ],
            &MergeOptions::PER_MATCH,
        );

        assert_eq!(merged.len(), 2);
        let ahri = &merged[0];
        assert_eq!(ahri.id, "Ahri");
        assert_eq!(ahri.count, 2);
        assert_eq!(ahri.tiers, vec![entry(2, 1), entry(3, 1)]);
        assert_eq!(
            ahri.items,
            vec![entry("Rabadon".to_string(), 2), entry("Blue".to_string(), 1)]
        );
        assert_eq!(ahri.neighbors[0].id, "Lux");
        assert_eq!(ahri.neighbors[0].count, 2);
        assert_eq!(ahri.neighbors[0].tiers, vec![entry(1, 2)]);
    }

    #[test]
    fn test_merge_units_drops_empty_bag_and_truncates() {
        let merged = merge_units(
            vec![
                unit("Ahri", 2, &[EMPTY_BAG_ITEM, "A", "B"], &["N1", "N2", "N3"]),
                unit("Ahri", 2, &[EMPTY_BAG_ITEM, "A"], &["N2"]),
            ],
            &MergeOptions::published(2, 1),
        );

        let ahri = &merged[0];
        assert_eq!(ahri.items, vec![entry("A".to_string(), 2)]);
        assert_eq!(ahri.neighbors.len(), 2);
        assert_eq!(ahri.neighbors[0].id, "N2");
        assert_eq!(ahri.neighbors[0].count, 2);
    }

    #[test]
    fn test_merge_traits_filters_inactive() {
        let merged = merge_traits(
            vec![
                trait_stats("Ionia", 2, 2, vec![trait_neighbor("Bruiser", 0), trait_neighbor("Sorc", 1)]),
                trait_stats("Ionia", 2, 2, vec![trait_neighbor("Sorc", 1)]),
                trait_stats("Bruiser", 0, 0, vec![]),
            ],
            &MergeOptions::published(10, 10),
        )
        .unwrap();

        assert_eq!(merged.len(), 1);
        let ionia = &merged[0];
        assert_eq!(ionia.id, "Ionia#2");
        assert_eq!(ionia.count, 2);
        assert_eq!(ionia.neighbors.len(), 1);
        assert_eq!(ionia.neighbors[0].id, "Sorc#1");
        assert_eq!(ionia.neighbors[0].count, 2);
    }

    #[test]
    fn test_merge_traits_keeps_inactive_per_match() {
        let merged = merge_traits(
            vec![trait_stats("Bruiser", 0, 0, vec![])],
            &MergeOptions::PER_MATCH,
        )
        .unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_merge_traits_rejects_tier_mismatch() {
        let err = merge_traits(
            vec![trait_stats("Ionia", 2, 2, vec![]), trait_stats("Ionia", 2, 3, vec![])],
            &MergeOptions::PER_MATCH,
        )
        .unwrap_err();

        assert!(matches!(
            &err,
            AggregateError::InconsistentGroup { id, field: "tierCurrent", .. } if id == "Ionia#2"
        ));
    }

    #[test]
    fn test_merge_augments_truncates_neighbors() {
        let augment = |id: &str, neighbors: &[&str]| AugmentStats {
            id: id.to_string(),
            count: 1,
            neighbors: neighbors.iter().map(|n| CountEntry::one(n.to_string())).collect(),
            ranking: Ranking::UNRANKED,
        };
        let merged = merge_augments(
            vec![augment("A", &["B", "C"]), augment("A", &["C"]), augment("B", &["A"])],
            &MergeOptions::published(1, 10),
        );

        assert_eq!(merged[0].id, "A");
        assert_eq!(merged[0].count, 2);
        assert_eq!(merged[0].neighbors, vec![entry("C".to_string(), 2)]);
    }
}
