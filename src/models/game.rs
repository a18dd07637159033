//! Upstream match payloads and the persisted match record.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{League, Top4Stats};

/// Queue id of ranked games.
pub const RANKED_QUEUE_ID: u32 = 1100;

static RELEASE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*<Releases/(?P<release>.*)>").expect("release version pattern is valid")
});

/// Extract the release version from an upstream `game_version` string,
/// e.g. `"Version 13.12.509.8402 (Jun 09 2023/15:34:12) [PUBLIC] <Releases/13.12>"`
/// yields `"13.12"`.
pub fn parse_release_version(game_version: &str) -> Option<String> {
    RELEASE_VERSION_RE
        .captures(game_version)
        .and_then(|caps| caps.name("release"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Numeric `(major, minor)` of a release version such as `"13.12"`.
pub fn version_components(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub data_version: String,
    pub match_id: String,
    /// Participant PUUIDs.
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantTrait {
    pub name: String,
    pub style: u8,
    pub tier_current: u8,
    pub tier_total: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantUnit {
    pub character_id: String,
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
    /// Star level.
    pub tier: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchParticipant {
    #[serde(default)]
    pub puuid: String,
    pub placement: u8,
    #[serde(default)]
    pub augments: Vec<String>,
    #[serde(default)]
    pub traits: Vec<ParticipantTrait>,
    #[serde(default)]
    pub units: Vec<ParticipantUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfo {
    pub game_datetime: i64,
    pub game_length: f64,
    #[serde(default)]
    pub game_variation: Option<String>,
    pub game_version: String,
    pub participants: Vec<MatchParticipant>,
    pub queue_id: u32,
    pub tft_set_number: u32,
}

/// Typed view of the upstream match payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRaw {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

impl MatchRaw {
    pub fn is_ranked(&self, ranked_queue_id: u32) -> bool {
        self.info.queue_id == ranked_queue_id
    }

    /// Participants who finished first through fourth.
    pub fn top4(&self) -> impl Iterator<Item = &MatchParticipant> {
        self.info.participants.iter().filter(|p| p.placement <= 4)
    }
}

/// One persisted match. Written once per fetched match and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Upstream payload, kept verbatim.
    pub raw: serde_json::Value,
    pub release_version: String,
    pub top4: Top4Stats,
    pub player_avg_tier: League,
}

impl Match {
    /// Upstream match identifier, also the file stem.
    pub fn match_id(&self) -> Option<&str> {
        self.raw
            .get("metadata")
            .and_then(|m| m.get("match_id"))
            .and_then(|id| id.as_str())
    }
}
