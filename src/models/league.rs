//! Competitive leagues and league scores.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Ranked league, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl League {
    /// Highest tier first.
    pub const ALL: [League; 9] = [
        League::Challenger,
        League::Grandmaster,
        League::Master,
        League::Diamond,
        League::Platinum,
        League::Gold,
        League::Silver,
        League::Bronze,
        League::Iron,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            League::Iron => "IRON",
            League::Bronze => "BRONZE",
            League::Silver => "SILVER",
            League::Gold => "GOLD",
            League::Platinum => "PLATINUM",
            League::Diamond => "DIAMOND",
            League::Master => "MASTER",
            League::Grandmaster => "GRANDMASTER",
            League::Challenger => "CHALLENGER",
        }
    }

    /// Competitive tier value, IRON = 0 through CHALLENGER = 8.
    pub fn value(&self) -> u8 {
        match self {
            League::Iron => 0,
            League::Bronze => 1,
            League::Silver => 2,
            League::Gold => 3,
            League::Platinum => 4,
            League::Diamond => 5,
            League::Master => 6,
            League::Grandmaster => 7,
            League::Challenger => 8,
        }
    }

    /// Apex leagues have a single ladder endpoint instead of paged divisions.
    pub fn is_apex(&self) -> bool {
        matches!(
            self,
            League::Master | League::Grandmaster | League::Challenger
        )
    }

    /// Score of a (league, division) pair.
    pub fn score(&self, division: Division) -> f64 {
        self.value() as f64 + division.bonus()
    }

    /// League whose score band contains `score`. Scores are clamped to the
    /// IRON..CHALLENGER range.
    pub fn from_score(score: f64) -> League {
        let floor = score.floor();
        if floor <= 0.0 {
            return League::Iron;
        }
        League::ALL
            .into_iter()
            .find(|l| l.value() as f64 <= floor)
            .unwrap_or(League::Iron)
    }

    /// Mean league of a set of ranked entries, `None` when empty.
    pub fn average<I>(entries: I) -> Option<League>
    where
        I: IntoIterator<Item = (League, Division)>,
    {
        let (sum, n) = entries
            .into_iter()
            .fold((0.0, 0usize), |(sum, n), (league, division)| {
                (sum + league.score(division), n + 1)
            });
        if n == 0 {
            None
        } else {
            Some(League::from_score(sum / n as f64))
        }
    }

    /// Sort leagues highest tier first.
    pub fn sort_descending(leagues: &mut [League]) {
        leagues.sort_by(|a, b| b.cmp(a));
    }
}

impl PartialOrd for League {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for League {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for League {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        League::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("league", s))
    }
}

/// Division within a non-apex league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    pub fn bonus(&self) -> f64 {
        match self {
            Division::I => 0.75,
            Division::II => 0.5,
            Division::III => 0.25,
            Division::IV => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
        }
    }
}

impl FromStr for Division {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Division::I, Division::II, Division::III, Division::IV]
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("division", s))
    }
}
