//! Typed upstream endpoints.

use serde::{Deserialize, Serialize};
use url::Url;

use super::{FetchError, RateLimitedClient};
use crate::models::{Division, League, Region};

/// Queue type of ranked league entries.
pub const RANKED_QUEUE_TYPE: &str = "RANKED_TFT";

/// One ranked player from a league listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueItem {
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub league_points: i64,
}

/// Apex league listing (`challenger`, `grandmaster`, `master`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueList {
    #[serde(default)]
    pub entries: Vec<LeagueItem>,
}

/// A ranked league entry of one player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
}

impl LeagueEntry {
    /// `(league, division)` of a ranked entry. Tiers outside [`League`] are
    /// ignored; a missing division counts as I.
    pub fn standing(&self) -> Option<(League, Division)> {
        if self.queue_type != RANKED_QUEUE_TYPE {
            return None;
        }
        let league = self.tier.as_deref()?.parse().ok()?;
        let division = self
            .rank
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or(Division::I);
        Some((league, division))
    }
}

impl From<LeagueEntry> for LeagueItem {
    fn from(entry: LeagueEntry) -> Self {
        LeagueItem {
            summoner_id: entry.summoner_id,
            puuid: entry.puuid,
            league_points: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    pub id: Option<String>,
    pub puuid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Endpoint wrapper over the shared rate-limited client.
pub struct RiotApi<'a> {
    client: &'a RateLimitedClient,
}

impl<'a> RiotApi<'a> {
    pub fn new(client: &'a RateLimitedClient) -> Self {
        Self { client }
    }

    /// Every player listed in a league. Apex leagues use the league listing,
    /// lower leagues the first page of division I entries.
    pub async fn ranked_players(
        &self,
        region: Region,
        league: League,
    ) -> Result<Vec<LeagueItem>, FetchError> {
        let url = ranked_players_url(region, league)?;
        if league.is_apex() {
            let list: LeagueList = self.client.fetch(&url).await?;
            Ok(list.entries)
        } else {
            let entries: Vec<LeagueEntry> = self.client.fetch(&url).await?;
            Ok(entries.into_iter().map(LeagueItem::from).collect())
        }
    }

    pub async fn summoner(&self, region: Region, summoner_id: &str) -> Result<Summoner, FetchError> {
        let url = endpoint(
            region.platform_host(),
            &["tft", "summoner", "v1", "summoners", summoner_id],
            &[],
        )?;
        self.client.fetch(&url).await
    }

    pub async fn summoner_by_puuid(&self, region: Region, puuid: &str) -> Result<Summoner, FetchError> {
        let url = endpoint(
            region.platform_host(),
            &["tft", "summoner", "v1", "summoners", "by-puuid", puuid],
            &[],
        )?;
        self.client.fetch(&url).await
    }

    /// Most recent match ids of a player.
    pub async fn match_ids(
        &self,
        region: Region,
        puuid: &str,
        count: usize,
    ) -> Result<Vec<String>, FetchError> {
        let count = count.to_string();
        let url = endpoint(
            region.regional_host(),
            &["tft", "match", "v1", "matches", "by-puuid", puuid, "ids"],
            &[("start", "0"), ("count", &count)],
        )?;
        self.client.fetch(&url).await
    }

    /// Full match payload, untyped so it can be stored verbatim.
    pub async fn match_payload(
        &self,
        region: Region,
        match_id: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = endpoint(
            region.regional_host(),
            &["tft", "match", "v1", "matches", match_id],
            &[],
        )?;
        self.client.fetch(&url).await
    }

    /// League entries of a summoner across queues.
    pub async fn league_entries(
        &self,
        region: Region,
        summoner_id: &str,
    ) -> Result<Vec<LeagueEntry>, FetchError> {
        let url = endpoint(
            region.platform_host(),
            &["tft", "league", "v1", "entries", "by-summoner", summoner_id],
            &[],
        )?;
        self.client.fetch(&url).await
    }
}

pub fn ranked_players_url(region: Region, league: League) -> Result<Url, FetchError> {
    if league.is_apex() {
        let name = league.as_str().to_ascii_lowercase();
        endpoint(region.platform_host(), &["tft", "league", "v1", &name], &[])
    } else {
        endpoint(
            region.platform_host(),
            &["tft", "league", "v1", "entries", league.as_str(), "I"],
            &[("page", "1")],
        )
    }
}

fn endpoint(host: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
    let mut url = Url::parse(&format!("https://{}", host))
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", host, e)))?;

    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(host.to_string()))?
        .pop_if_empty()
        .extend(segments);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ClientConfig, ScriptedTransport};
    use std::sync::Arc;

    fn client(transport: &Arc<ScriptedTransport>) -> RateLimitedClient {
        RateLimitedClient::with_transport(
            ClientConfig {
                api_key: "k".to_string(),
                cooldown: std::time::Duration::ZERO,
                ..Default::default()
            },
            transport.clone(),
        )
        .unwrap()
    }

    #[test]
    fn test_ranked_players_urls() {
        assert_eq!(
            ranked_players_url(Region::Na, League::Grandmaster).unwrap().as_str(),
            "https://na1.api.riotgames.com/tft/league/v1/grandmaster"
        );
        assert_eq!(
            ranked_players_url(Region::Kr, League::Diamond).unwrap().as_str(),
            "https://kr.api.riotgames.com/tft/league/v1/entries/DIAMOND/I?page=1"
        );
    }

    #[test]
    fn test_league_entry_standing() {
        let entry: LeagueEntry = serde_json::from_value(serde_json::json!({
            "summonerId": "s1",
            "queueType": "RANKED_TFT",
            "tier": "DIAMOND",
            "rank": "II"
        }))
        .unwrap();
        assert_eq!(entry.standing(), Some((League::Diamond, Division::II)));

        let other: LeagueEntry = serde_json::from_value(serde_json::json!({
            "queueType": "RANKED_TFT_TURBO",
            "tier": "GOLD",
            "rank": "I"
        }))
        .unwrap();
        assert_eq!(other.standing(), None);

        let emerald: LeagueEntry = serde_json::from_value(serde_json::json!({
            "queueType": "RANKED_TFT",
            "tier": "EMERALD",
            "rank": "I"
        }))
        .unwrap();
        assert_eq!(emerald.standing(), None);
    }

    #[tokio::test]
    async fn test_apex_players_come_from_entries() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(
            r#"{"tier": "CHALLENGER", "entries": [{"summonerId": "a"}, {"summonerId": "b"}]}"#,
        )]));
        let client = client(&transport);

        let players = RiotApi::new(&client)
            .ranked_players(Region::Euw, League::Challenger)
            .await
            .unwrap();

        let ids: Vec<_> = players.iter().filter_map(|p| p.summoner_id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            transport.requested_urls(),
            vec!["https://euw1.api.riotgames.com/tft/league/v1/challenger"]
        );
    }

    #[tokio::test]
    async fn test_lower_league_players_come_from_array() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(
            r#"[{"summonerId": "a", "queueType": "RANKED_TFT", "tier": "DIAMOND", "rank": "I"}]"#,
        )]));
        let client = client(&transport);

        let players = RiotApi::new(&client)
            .ranked_players(Region::Na, League::Diamond)
            .await
            .unwrap();

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].summoner_id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_match_ids_use_regional_host() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(
            r#"["NA1_1", "NA1_2"]"#,
        )]));
        let client = client(&transport);

        let ids = RiotApi::new(&client)
            .match_ids(Region::Na, "puuid-1", 20)
            .await
            .unwrap();

        assert_eq!(ids, vec!["NA1_1", "NA1_2"]);
        assert_eq!(
            transport.requested_urls(),
            vec!["https://americas.api.riotgames.com/tft/match/v1/matches/by-puuid/puuid-1/ids?start=0&count=20"]
        );
    }
}
