//! Identity-tagged count records and the published statistics document.
//!
//! Every record carries an `id` and a `count`. Records of one category are
//! merged by id, and each record's `neighbors` collection holds the other
//! entities observed in the same top-4 composition, merged the same way.

use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::{Category, League, Region};

/// A count bucket keyed by a stable identity.
pub trait Tally {
    type Id: Eq + Hash + Clone;

    fn id(&self) -> &Self::Id;

    fn count(&self) -> u32;
}

/// Top-level records that receive a dense rank.
pub trait Ranked: Tally {
    fn ranking(&self) -> &Ranking;

    fn ranking_mut(&mut self) -> &mut Ranking;
}

/// Plain `{id, count}` record, used for star levels, items and augment
/// neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry<K> {
    pub id: K,
    pub count: u32,
}

impl<K> CountEntry<K> {
    pub fn new(id: K, count: u32) -> Self {
        Self { id, count }
    }

    /// A single observation.
    pub fn one(id: K) -> Self {
        Self { id, count: 1 }
    }
}

impl<K: Eq + Hash + Clone> Tally for CountEntry<K> {
    type Id = K;

    fn id(&self) -> &K {
        &self.id
    }

    fn count(&self) -> u32 {
        self.count
    }
}

/// Rank annotation. Per-match records carry [`Ranking::UNRANKED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: i64,
    pub rank_total_count: i64,
    pub comp_total_count: i64,
}

impl Ranking {
    pub const UNRANKED: Ranking = Ranking {
        rank: -1,
        rank_total_count: -1,
        comp_total_count: -1,
    };

    pub fn is_ranked(&self) -> bool {
        self.rank > 0
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Self::UNRANKED
    }
}

/// Item entry used for a unit carrying no items.
pub const NO_ITEM: &str = "no-item";

/// Placeholder item that never counts towards unit item statistics.
pub const EMPTY_BAG_ITEM: &str = "TFT_Item_EmptyBag";

/// Unit observed alongside another unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitNeighbor {
    pub id: String,
    pub count: u32,
    pub tiers: Vec<CountEntry<u8>>,
    pub items: Vec<CountEntry<String>>,
}

/// Unit frequency record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub id: String,
    pub count: u32,
    /// Star levels, most common first.
    pub tiers: Vec<CountEntry<u8>>,
    pub items: Vec<CountEntry<String>>,
    pub neighbors: Vec<UnitNeighbor>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

/// Trait observed alongside another trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitNeighbor {
    pub id: String,
    pub count: u32,
    pub name: String,
    pub style: u8,
    pub tier_current: u8,
    pub tier_total: u8,
}

/// Trait frequency record. The id is `"{name}#{style}"`, so the same trait at
/// different activation styles is counted separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitStats {
    pub id: String,
    pub count: u32,
    pub name: String,
    /// 0 means the trait was present but not active.
    pub style: u8,
    pub tier_current: u8,
    pub tier_total: u8,
    pub neighbors: Vec<TraitNeighbor>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

impl TraitStats {
    pub fn trait_id(name: &str, style: u8) -> String {
        format!("{}#{}", name, style)
    }
}

/// Augment frequency record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentStats {
    pub id: String,
    pub count: u32,
    pub neighbors: Vec<CountEntry<String>>,
    #[serde(flatten)]
    pub ranking: Ranking,
}

macro_rules! impl_tally {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Tally for $ty {
                type Id = String;

                fn id(&self) -> &String {
                    &self.id
                }

                fn count(&self) -> u32 {
                    self.count
                }
            }
        )*
    };
}

impl_tally!(UnitNeighbor, UnitStats, TraitNeighbor, TraitStats, AugmentStats);

macro_rules! impl_ranked {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Ranked for $ty {
                fn ranking(&self) -> &Ranking {
                    &self.ranking
                }

                fn ranking_mut(&mut self) -> &mut Ranking {
                    &mut self.ranking
                }
            }
        )*
    };
}

impl_ranked!(UnitStats, TraitStats, AugmentStats);

/// The three per-category collections of a match's top-4 players.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Top4Stats {
    pub augments: Vec<AugmentStats>,
    pub traits: Vec<TraitStats>,
    pub units: Vec<UnitStats>,
}

/// Identifies one published statistics document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsParams {
    pub version: String,
    pub region: Region,
    pub league: League,
    pub category: Category,
}

impl StatsParams {
    pub fn new(version: impl Into<String>, region: Region, league: League, category: Category) -> Self {
        Self {
            version: version.into(),
            region,
            league,
            category,
        }
    }
}

/// Published ranked table for one (version, region, league, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument<T> {
    #[serde(rename = "type")]
    pub category: Category,
    pub region: Region,
    pub version: String,
    pub league: League,
    /// Number of matches aggregated.
    pub count: usize,
    pub value: Vec<T>,
    /// Milliseconds since the Unix epoch at the start of the aggregation run.
    #[serde(rename = "lastUpdatedTS")]
    pub last_updated_ts: i64,
}

impl<T> StatsDocument<T> {
    pub fn params(&self) -> StatsParams {
        StatsParams::new(self.version.clone(), self.region, self.league, self.category)
    }
}
