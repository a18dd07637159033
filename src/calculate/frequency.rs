//! Group-sum-rank primitive.
//!
//! Records are grouped by id in first-seen order, counts are summed per
//! group, and an optional merge strategy turns each group into its output
//! record. Output is sorted by descending count; the sort is stable so ties
//! keep their grouping order.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::models::{CountEntry, Tally};

/// Aggregate `records` by id with a fallible merge strategy.
///
/// `merge` receives the whole group and the `{id, count}` seed holding the
/// summed count. A `truncate` of `None` or `Some(0)` keeps every record.
pub fn try_aggregate<T, O, E, F>(
    records: impl IntoIterator<Item = T>,
    mut merge: F,
    truncate: Option<usize>,
) -> Result<Vec<O>, E>
where
    T: Tally,
    O: Tally,
    F: FnMut(Vec<T>, CountEntry<T::Id>) -> Result<O, E>,
{
    let mut index: HashMap<T::Id, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for record in records {
        match index.get(record.id()).copied() {
            Some(i) => groups[i].push(record),
            None => {
                index.insert(record.id().clone(), groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        let id = group[0].id().clone();
        let count = group.iter().map(Tally::count).sum();
        merged.push(merge(group, CountEntry::new(id, count))?);
    }

    merged.sort_by(|a, b| b.count().cmp(&a.count()));

    if let Some(n) = truncate.filter(|&n| n > 0) {
        merged.truncate(n);
    }

    Ok(merged)
}

/// Aggregate `records` by id with an infallible merge strategy.
pub fn aggregate<T, O, F>(
    records: impl IntoIterator<Item = T>,
    mut merge: F,
    truncate: Option<usize>,
) -> Vec<O>
where
    T: Tally,
    O: Tally,
    F: FnMut(Vec<T>, CountEntry<T::Id>) -> O,
{
    match try_aggregate(
        records,
        |group, seed| Ok::<O, Infallible>(merge(group, seed)),
        truncate,
    ) {
        Ok(merged) => merged,
        Err(never) => match never {},
    }
}

/// Aggregate without enrichment: the seed is the output.
pub fn aggregate_counts<T: Tally>(
    records: impl IntoIterator<Item = T>,
    truncate: Option<usize>,
) -> Vec<CountEntry<T::Id>> {
    aggregate(records, |_, seed| seed, truncate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, u32)]) -> Vec<CountEntry<String>> {
        pairs
            .iter()
            .map(|(id, count)| CountEntry::new(id.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_aggregate_sums_by_id() {
        let result = aggregate_counts(
            entries(&[("unitX", 2), ("unitY", 1), ("unitX", 1), ("unitY", 3)]),
            None,
        );
        assert_eq!(result, entries(&[("unitY", 4), ("unitX", 3)]));
    }

    #[test]
    fn test_aggregate_empty_input() {
        let result = aggregate_counts(Vec::<CountEntry<String>>::new(), Some(10));
        assert!(result.is_empty());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let result = aggregate_counts(entries(&[("b", 1), ("a", 1), ("c", 2)]), None);
        assert_eq!(result, entries(&[("c", 2), ("b", 1), ("a", 1)]));
    }

    #[test]
    fn test_truncate_zero_means_no_limit() {
        let input = entries(&[("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(aggregate_counts(input.clone(), Some(0)).len(), 3);
        assert_eq!(aggregate_counts(input, None).len(), 3);
    }

    #[test]
    fn test_truncate_keeps_highest_counts() {
        let input = entries(&[("a", 1), ("b", 5), ("c", 3), ("d", 4), ("b", 1)]);
        let full = aggregate_counts(input.clone(), None);
        let truncated = aggregate_counts(input, Some(2));

        assert_eq!(truncated.len(), 2);
        assert_eq!(truncated, full[..2].to_vec());
        assert_eq!(truncated, entries(&[("b", 6), ("d", 4)]));
    }

    #[test]
    fn test_reaggregating_output_is_stable() {
        let input = entries(&[("a", 1), ("b", 2), ("a", 4), ("c", 1), ("b", 1)]);
        let once = aggregate_counts(input, None);

        // Re-expand every aggregated record into unit observations.
        let expanded: Vec<CountEntry<String>> = once
            .iter()
            .flat_map(|e| std::iter::repeat(CountEntry::one(e.id.clone())).take(e.count as usize))
            .collect();
        let twice = aggregate_counts(expanded, None);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_receives_whole_group() {
        let result = aggregate(
            entries(&[("a", 1), ("a", 2), ("b", 1)]),
            |group, seed| {
                assert!(group.iter().all(|e| e.id == seed.id));
                CountEntry::new(seed.id, seed.count * 10 + group.len() as u32)
            },
            None,
        );
        assert_eq!(result, entries(&[("a", 32), ("b", 11)]));
    }

    #[test]
    fn test_try_aggregate_propagates_error() {
        let result: Result<Vec<CountEntry<String>>, String> = try_aggregate(
            entries(&[("a", 1), ("bad", 1)]),
            |_, seed| {
                if seed.id == "bad" {
                    Err(format!("rejected {}", seed.id))
                } else {
                    Ok(seed)
                }
            },
            None,
        );
        assert_eq!(result.unwrap_err(), "rejected bad");
    }

    #[test]
    fn test_numeric_ids() {
        let tiers = vec![
            CountEntry::new(2u8, 1),
            CountEntry::new(3u8, 1),
            CountEntry::new(2u8, 1),
        ];
        assert_eq!(
            aggregate_counts(tiers, None),
            vec![CountEntry::new(2u8, 2), CountEntry::new(3u8, 1)]
        );
    }
}
