//! Pure transforms joining published tables with reference data.
//!
//! Every lookup that finds nothing yields a [`MissingReference`] and a
//! warning. The view is still produced with the raw id as its name.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::warn;

use super::{normalize_id, EntityKind, ItemRef, MissingReference, ReferenceData};
use crate::models::{
    AugmentStats, CountEntry, Ranking, TraitNeighbor, TraitStats, UnitNeighbor, UnitStats, NO_ITEM,
};

static DESC_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([^@]*)@").expect("description token pattern is valid"));

const PERCENT_SUFFIX: &str = "*100";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseItemView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub count: u32,
    pub base_items: Vec<BaseItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitNeighborView {
    pub id: String,
    pub name: String,
    pub cost: u8,
    pub image_url: Option<String>,
    pub count: u32,
    pub stars: String,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitView {
    pub id: String,
    pub name: String,
    pub cost: u8,
    pub image_url: Option<String>,
    pub count: u32,
    /// Most frequent star level.
    pub stars: String,
    pub traits: Vec<String>,
    pub items: Vec<ItemView>,
    pub neighbors: Vec<UnitNeighborView>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitNeighborView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub count: u32,
    pub style: u8,
    /// Units needed for the active tier.
    pub unit_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub count: u32,
    pub style: u8,
    pub unit_count: Option<u32>,
    pub neighbors: Vec<TraitNeighborView>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentNeighborView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Description with effect tokens substituted.
    pub desc: String,
    pub count: u32,
    pub neighbors: Vec<AugmentNeighborView>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

/// Reference lookups with the misses collected.
struct Lookup<'a> {
    data: &'a ReferenceData,
    missing: Vec<MissingReference>,
}

impl<'a> Lookup<'a> {
    fn new(data: &'a ReferenceData) -> Self {
        Self {
            data,
            missing: Vec::new(),
        }
    }

    fn miss(&mut self, missing: MissingReference) {
        warn!("[{}] {}", self.data.version(), missing);
        self.missing.push(missing);
    }

    fn finish<T>(self, views: Vec<T>) -> (Vec<T>, Vec<MissingReference>) {
        (views, self.missing)
    }

    fn item(&mut self, entry: &CountEntry<String>, owner: &str) -> ItemView {
        if entry.id == NO_ITEM {
            return ItemView {
                id: NO_ITEM.to_string(),
                name: NO_ITEM.to_string(),
                image_url: None,
                count: entry.count,
                base_items: Vec::new(),
            };
        }

        let data = self.data;
        let Some(item) = data.item(&entry.id) else {
            self.miss(MissingReference::new(EntityKind::Item, &entry.id).within(owner));
            return ItemView {
                id: entry.id.clone(),
                name: entry.id.clone(),
                image_url: None,
                count: entry.count,
                base_items: Vec::new(),
            };
        };

        let mut base_items = Vec::new();
        for component in &item.composition {
            match data.item(component) {
                Some(base) => base_items.push(BaseItemView {
                    id: base.api_name.clone(),
                    name: base.name.clone(),
                    image_url: data.asset_url(&base.icon),
                }),
                None => self.miss(MissingReference::new(EntityKind::Item, component).within(&item.api_name)),
            }
        }

        ItemView {
            id: item.api_name.clone(),
            name: item.name.clone(),
            image_url: data.asset_url(&item.icon),
            count: entry.count,
            base_items,
        }
    }

    fn unit_neighbor(&mut self, neighbor: &UnitNeighbor, owner: &str) -> UnitNeighborView {
        let data = self.data;
        let champion = data.champion(&neighbor.id);
        if champion.is_none() {
            self.miss(MissingReference::new(EntityKind::Unit, &neighbor.id).within(owner));
        }

        UnitNeighborView {
            id: neighbor.id.clone(),
            name: champion.map_or_else(|| neighbor.id.clone(), |c| c.name.clone()),
            cost: champion.map_or(0, |c| c.cost),
            image_url: champion.and_then(|c| data.asset_url(&c.icon)),
            count: neighbor.count,
            stars: stars(&neighbor.tiers),
            items: neighbor
                .items
                .iter()
                .map(|item| self.item(item, &neighbor.id))
                .collect(),
        }
    }

    /// `(display name, icon url, units needed)` of a trait.
    fn trait_info(
        &mut self,
        id: &str,
        api_name: &str,
        tier_current: u8,
        tier_total: u8,
        owner: Option<&str>,
    ) -> (String, Option<String>, Option<u32>) {
        let data = self.data;
        let Some(trait_ref) = data.trait_ref(api_name) else {
            let missing = MissingReference::new(EntityKind::Trait, api_name);
            self.miss(match owner {
                Some(owner) => missing.within(owner),
                None => missing,
            });
            return (api_name.to_string(), None, None);
        };

        if trait_ref.effects.len() != usize::from(tier_total) {
            self.miss(MissingReference::new(EntityKind::Trait, id).within(format!(
                "{} tiers in reference, {} in statistics",
                trait_ref.effects.len(),
                tier_total
            )));
        }

        let unit_count = usize::from(tier_current)
            .checked_sub(1)
            .and_then(|idx| trait_ref.effects.get(idx))
            .map(|effect| effect.min_units);

        (trait_ref.name.clone(), data.asset_url(&trait_ref.icon), unit_count)
    }

    fn trait_neighbor(&mut self, neighbor: &TraitNeighbor, owner: &str) -> TraitNeighborView {
        let (name, image_url, unit_count) = self.trait_info(
            &neighbor.id,
            &neighbor.name,
            neighbor.tier_current,
            neighbor.tier_total,
            Some(owner),
        );
        TraitNeighborView {
            id: neighbor.id.clone(),
            name,
            image_url,
            count: neighbor.count,
            style: neighbor.style,
            unit_count,
        }
    }

    fn augment_desc(&mut self, augment: &ItemRef) -> String {
        let effects: HashMap<String, &serde_json::Value> = augment
            .effects
            .iter()
            .map(|(key, value)| (normalize_id(key), value))
            .collect();

        let mut unresolved = Vec::new();
        let desc = DESC_TOKEN_RE
            .replace_all(&augment.desc, |caps: &Captures| {
                let token = &caps[1];
                match resolve_effect(&effects, token) {
                    Some(value) => value,
                    None => {
                        unresolved.push(token.to_string());
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();

        for token in unresolved {
            self.miss(MissingReference::new(EntityKind::Effect, token).within(&augment.api_name));
        }
        desc
    }
}

/// Look a description token up in the effects; a `*100` suffix scales the
/// value to a whole percentage.
fn resolve_effect(effects: &HashMap<String, &serde_json::Value>, token: &str) -> Option<String> {
    if let Some(value) = effects.get(&normalize_id(token)) {
        return Some(format_effect(value, 1.0));
    }

    let base = token.strip_suffix(PERCENT_SUFFIX)?;
    effects
        .get(&normalize_id(base))
        .map(|value| format_effect(value, 100.0))
}

fn format_effect(value: &serde_json::Value, scale: f64) -> String {
    match value.as_f64() {
        Some(n) => {
            let scaled = n * scale;
            if scale != 1.0 || scaled.fract() == 0.0 {
                format!("{:.0}", scaled)
            } else {
                scaled.to_string()
            }
        }
        None => value
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
    }
}

/// Star glyphs of the most frequent star level.
fn stars(tiers: &[CountEntry<u8>]) -> String {
    match tiers.first().map(|t| t.id) {
        Some(n @ 1..=3) => "★".repeat(usize::from(n)),
        _ => String::new(),
    }
}

pub fn enrich_units(
    table: &[UnitStats],
    data: &ReferenceData,
) -> (Vec<UnitView>, Vec<MissingReference>) {
    let mut lookup = Lookup::new(data);

    let views = table
        .iter()
        .map(|unit| {
            let champion = data.champion(&unit.id);
            if champion.is_none() {
                lookup.miss(MissingReference::new(EntityKind::Unit, &unit.id));
            }

            UnitView {
                id: unit.id.clone(),
                name: champion.map_or_else(|| unit.id.clone(), |c| c.name.clone()),
                cost: champion.map_or(0, |c| c.cost),
                image_url: champion.and_then(|c| data.asset_url(&c.icon)),
                count: unit.count,
                stars: stars(&unit.tiers),
                traits: champion
                    .map(|c| data.champion_traits(c).map(|t| t.name.clone()).collect())
                    .unwrap_or_default(),
                items: unit
                    .items
                    .iter()
                    .map(|item| lookup.item(item, &unit.id))
                    .collect(),
                neighbors: unit
                    .neighbors
                    .iter()
                    .map(|n| lookup.unit_neighbor(n, &unit.id))
                    .collect(),
                ranking: unit.ranking,
            }
        })
        .collect();

    lookup.finish(views)
}

pub fn enrich_traits(
    table: &[TraitStats],
    data: &ReferenceData,
) -> (Vec<TraitView>, Vec<MissingReference>) {
    let mut lookup = Lookup::new(data);

    let views = table
        .iter()
        .map(|t| {
            let (name, image_url, unit_count) =
                lookup.trait_info(&t.id, &t.name, t.tier_current, t.tier_total, None);
            TraitView {
                id: t.id.clone(),
                name,
                image_url,
                count: t.count,
                style: t.style,
                unit_count,
                neighbors: t
                    .neighbors
                    .iter()
                    .map(|n| lookup.trait_neighbor(n, &t.id))
                    .collect(),
                ranking: t.ranking,
            }
        })
        .collect();

    lookup.finish(views)
}

pub fn enrich_augments(
    table: &[AugmentStats],
    data: &ReferenceData,
) -> (Vec<AugmentView>, Vec<MissingReference>) {
    let mut lookup = Lookup::new(data);

    let views = table
        .iter()
        .map(|augment| {
            let reference = data.item(&augment.id);
            let desc = match reference {
                Some(r) => lookup.augment_desc(r),
                None => {
                    lookup.miss(MissingReference::new(EntityKind::Augment, &augment.id));
                    String::new()
                }
            };

            AugmentView {
                id: augment.id.clone(),
                name: reference.map_or_else(|| augment.id.clone(), |r| r.name.clone()),
                image_url: reference.and_then(|r| data.asset_url(&r.icon)),
                desc,
                count: augment.count,
                neighbors: augment
                    .neighbors
                    .iter()
                    .map(|n| {
                        let neighbor = data.item(&n.id);
                        if neighbor.is_none() {
                            lookup.miss(
                                MissingReference::new(EntityKind::Augment, &n.id).within(&augment.id),
                            );
                        }
                        AugmentNeighborView {
                            id: n.id.clone(),
                            name: neighbor.map_or_else(|| n.id.clone(), |r| r.name.clone()),
                            image_url: neighbor.and_then(|r| data.asset_url(&r.icon)),
                            count: n.count,
                        }
                    })
                    .collect(),
                ranking: augment.ranking,
            }
        })
        .collect();

    lookup.finish(views)
}
