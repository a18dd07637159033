//! Upstream platform regions and their routing hosts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A game server region.
///
/// Summoner and league lookups go to the region's platform host; match
/// lookups go to the shared regional host (AMERICAS serves NA, BR, LAN and
/// LAS; ASIA serves KR and JP; EUROPE serves EUNE, EUW, TR and RU; SEA serves
/// the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Br,
    Eune,
    Euw,
    Jp,
    Kr,
    Lan,
    Las,
    Na,
    Oce,
    Tr,
    Ru,
    Ph,
    Sg,
    Th,
    Tw,
    Vn,
}

impl Region {
    pub const ALL: [Region; 16] = [
        Region::Br,
        Region::Eune,
        Region::Euw,
        Region::Jp,
        Region::Kr,
        Region::Lan,
        Region::Las,
        Region::Na,
        Region::Oce,
        Region::Tr,
        Region::Ru,
        Region::Ph,
        Region::Sg,
        Region::Th,
        Region::Tw,
        Region::Vn,
    ];

    /// Directory and wire name (e.g. "EUW").
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Br => "BR",
            Region::Eune => "EUNE",
            Region::Euw => "EUW",
            Region::Jp => "JP",
            Region::Kr => "KR",
            Region::Lan => "LAN",
            Region::Las => "LAS",
            Region::Na => "NA",
            Region::Oce => "OCE",
            Region::Tr => "TR",
            Region::Ru => "RU",
            Region::Ph => "PH",
            Region::Sg => "SG",
            Region::Th => "TH",
            Region::Tw => "TW",
            Region::Vn => "VN",
        }
    }

    /// Host for summoner and league endpoints.
    pub fn platform_host(&self) -> &'static str {
        match self {
            Region::Br => "br1.api.riotgames.com",
            Region::Eune => "eun1.api.riotgames.com",
            Region::Euw => "euw1.api.riotgames.com",
            Region::Jp => "jp1.api.riotgames.com",
            Region::Kr => "kr.api.riotgames.com",
            Region::Lan => "la1.api.riotgames.com",
            Region::Las => "la2.api.riotgames.com",
            Region::Na => "na1.api.riotgames.com",
            Region::Oce => "oc1.api.riotgames.com",
            Region::Tr => "tr1.api.riotgames.com",
            Region::Ru => "ru.api.riotgames.com",
            Region::Ph => "ph2.api.riotgames.com",
            Region::Sg => "sg2.api.riotgames.com",
            Region::Th => "th2.api.riotgames.com",
            Region::Tw => "tw2.api.riotgames.com",
            Region::Vn => "vn2.api.riotgames.com",
        }
    }

    /// Host for match endpoints.
    pub fn regional_host(&self) -> &'static str {
        match self {
            Region::Br | Region::Lan | Region::Las | Region::Na => "americas.api.riotgames.com",
            Region::Jp | Region::Kr => "asia.api.riotgames.com",
            Region::Eune | Region::Euw | Region::Tr | Region::Ru => "europe.api.riotgames.com",
            Region::Oce | Region::Ph | Region::Sg | Region::Th | Region::Tw | Region::Vn => {
                "sea.api.riotgames.com"
            }
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl FromStr for Region {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("region", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_round_trips_through_str() {
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn test_region_parse_is_case_insensitive() {
        assert_eq!("euw".parse::<Region>().unwrap(), Region::Euw);
        assert_eq!(" KR ".parse::<Region>().unwrap(), Region::Kr);
    }

    #[test]
    fn test_region_parse_unknown() {
        let err = ".DS_Store".parse::<Region>().unwrap_err();
        assert_eq!(err.kind, "region");
    }

    #[test]
    fn test_regional_routing() {
        assert_eq!(Region::Na.regional_host(), "americas.api.riotgames.com");
        assert_eq!(Region::Kr.regional_host(), "asia.api.riotgames.com");
        assert_eq!(Region::Eune.regional_host(), "europe.api.riotgames.com");
        assert_eq!(Region::Oce.regional_host(), "sea.api.riotgames.com");
        assert_eq!(Region::Eune.platform_host(), "eun1.api.riotgames.com");
    }

    #[test]
    fn test_region_serialization() {
        let json = serde_json::to_string(&Region::Eune).unwrap();
        assert_eq!(json, "\"EUNE\"");
        let parsed: Region = serde_json::from_str("\"NA\"").unwrap();
        assert_eq!(parsed, Region::Na);
    }
}
