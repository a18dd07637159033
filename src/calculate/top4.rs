//! Per-match top-4 derivation.
//!
//! Every entity on a top-4 board is one observation; the other entities on
//! the same board are its neighbors. Observations are merged per match before
//! the match is persisted.

use crate::models::{
    AugmentStats, CountEntry, MatchParticipant, MatchRaw, ParticipantTrait, ParticipantUnit,
    Ranking, Top4Stats, TraitNeighbor, TraitStats, UnitNeighbor, UnitStats, NO_ITEM,
};

use super::merge::{merge_augments, merge_traits, merge_units, MergeOptions};
use super::AggregateError;

/// Derive the three top-4 collections of a match.
pub fn derive_top4(raw: &MatchRaw) -> Result<Top4Stats, AggregateError> {
    let top4: Vec<&MatchParticipant> = raw.top4().collect();
    Ok(Top4Stats {
        augments: augment_records(&top4),
        traits: trait_records(&top4)?,
        units: unit_records(&top4),
    })
}

fn unit_items(unit: &ParticipantUnit) -> Vec<CountEntry<String>> {
    if unit.item_names.is_empty() {
        vec![CountEntry::one(NO_ITEM.to_string())]
    } else {
        unit.item_names
            .iter()
            .map(|name| CountEntry::one(name.clone()))
            .collect()
    }
}

pub fn unit_records(participants: &[&MatchParticipant]) -> Vec<UnitStats> {
    let observed = participants
        .iter()
        .flat_map(|p| {
            p.units.iter().map(move |unit| UnitStats {
                id: unit.character_id.clone(),
                count: 1,
                tiers: vec![CountEntry::one(unit.tier)],
                items: unit_items(unit),
                neighbors: p
                    .units
                    .iter()
                    .filter(|other| other.character_id != unit.character_id)
                    .map(|other| UnitNeighbor {
                        id: other.character_id.clone(),
                        count: 1,
                        tiers: vec![CountEntry::one(other.tier)],
                        items: unit_items(other),
                    })
                    .collect(),
                ranking: Ranking::UNRANKED,
            })
        })
        .collect();

    merge_units(observed, &MergeOptions::PER_MATCH)
}

fn trait_neighbor(t: &ParticipantTrait) -> TraitNeighbor {
    TraitNeighbor {
        id: TraitStats::trait_id(&t.name, t.style),
        count: 1,
        name: t.name.clone(),
        style: t.style,
        tier_current: t.tier_current,
        tier_total: t.tier_total,
    }
}

pub fn trait_records(participants: &[&MatchParticipant]) -> Result<Vec<TraitStats>, AggregateError> {
    let observed = participants
        .iter()
        .flat_map(|p| {
            p.traits.iter().map(move |t| TraitStats {
                id: TraitStats::trait_id(&t.name, t.style),
                count: 1,
                name: t.name.clone(),
                style: t.style,
                tier_current: t.tier_current,
                tier_total: t.tier_total,
                neighbors: p
                    .traits
                    .iter()
                    .filter(|other| other.name != t.name)
                    .map(trait_neighbor)
                    .collect(),
                ranking: Ranking::UNRANKED,
            })
        })
        .collect();

    merge_traits(observed, &MergeOptions::PER_MATCH)
}

pub fn augment_records(participants: &[&MatchParticipant]) -> Vec<AugmentStats> {
    let observed = participants
        .iter()
        .flat_map(|p| {
            p.augments.iter().map(move |augment| AugmentStats {
                id: augment.clone(),
                count: 1,
                neighbors: p
                    .augments
                    .iter()
                    .filter(|other| *other != augment)
                    .map(|other| CountEntry::one(other.clone()))
                    .collect(),
                ranking: Ranking::UNRANKED,
            })
        })
        .collect();

    merge_augments(observed, &MergeOptions::PER_MATCH)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;

    pub fn participant(
        placement: u8,
        units: &[(&str, u8, &str)],
        traits: &[(&str, u8)],
        augments: &[&str],
    ) -> serde_json::Value {
        serde_json::json!({
            "puuid": format!("puuid-{}", placement),
            "placement": placement,
            "augments": augments,
            "traits": traits.iter().map(|(name, style)| serde_json::json!({
                "name": name,
                "style": style,
                "tier_current": style,
                "tier_total": 4
            })).collect::<Vec<_>>(),
            "units": units.iter().map(|(id, tier, items)| serde_json::json!({
                "character_id": id,
                "itemNames": items.split(',').filter(|i| !i.is_empty()).collect::<Vec<_>>(),
                "tier": tier
            })).collect::<Vec<_>>()
        })
    }

    pub fn raw_match(match_id: &str, participants: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({
            "metadata": {
                "data_version": "5",
                "match_id": match_id,
                "participants": []
            },
            "info": {
                "game_datetime": 1686300000000i64,
                "game_length": 2100.0,
                "game_version": "Version 13.12.509.8402 (Jun 09 2023/15:34:12) [PUBLIC] <Releases/13.12>",
                "queue_id": RANKED_QUEUE_ID,
                "tft_set_number": 9,
                "participants": participants
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_match() -> MatchRaw {
        let json = raw_match(
            "NA1_100",
            vec![
                participant(
                    1,
                    &[("Ahri", 2, "Rabadon"), ("Lux", 1, "")],
                    &[("Sorcerer", 2), ("Bruiser", 0)],
                    &["AugA", "AugB"],
                ),
                participant(
                    3,
                    &[("Ahri", 3, ""), ("Zed", 2, "Blade")],
                    &[("Sorcerer", 2)],
                    &["AugA"],
                ),
                participant(7, &[("Garen", 1, "")], &[("Knight", 1)], &["AugC"]),
            ],
        );
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_only_top4_participants_count() {
        let top4 = derive_top4(&sample_match()).unwrap();
        assert!(top4.units.iter().all(|u| u.id != "Garen"));
        assert!(top4.traits.iter().all(|t| t.name != "Knight"));
        assert!(top4.augments.iter().all(|a| a.id != "AugC"));
    }

    #[test]
    fn test_unit_records() {
        let top4 = derive_top4(&sample_match()).unwrap();
        let ahri = &top4.units[0];

        assert_eq!(ahri.id, "Ahri");
        assert_eq!(ahri.count, 2);
        assert_eq!(ahri.tiers, vec![CountEntry::new(2, 1), CountEntry::new(3, 1)]);
        assert_eq!(
            ahri.items,
            vec![
                CountEntry::new("Rabadon".to_string(), 1),
                CountEntry::new(NO_ITEM.to_string(), 1)
            ]
        );
        let neighbor_ids: Vec<&str> = ahri.neighbors.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(neighbor_ids, vec!["Lux", "Zed"]);
        assert_eq!(ahri.ranking, Ranking::UNRANKED);
    }

    #[test]
    fn test_trait_records_keep_inactive() {
        let top4 = derive_top4(&sample_match()).unwrap();
        let ids: Vec<&str> = top4.traits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["Sorcerer#2", "Bruiser#0"]);
        assert_eq!(top4.traits[0].count, 2);
        assert_eq!(top4.traits[0].neighbors[0].id, "Bruiser#0");
    }

    #[test]
    fn test_augment_neighbors() {
        let top4 = derive_top4(&sample_match()).unwrap();
        let aug_a = &top4.augments[0];
        assert_eq!(aug_a.id, "AugA");
        assert_eq!(aug_a.count, 2);
        assert_eq!(aug_a.neighbors, vec![CountEntry::new("AugB".to_string(), 1)]);
    }
}
