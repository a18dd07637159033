//! Ingestion run.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, info, warn};

use super::SyncError;
use crate::calculate::derive_top4;
use crate::config::CollectorConfig;
use crate::fetch::riot::{LeagueItem, RiotApi};
use crate::fetch::RateLimitedClient;
use crate::models::{parse_release_version, League, Match, MatchRaw, Region};
use crate::storage::{BatchId, BatchKey, MatchStore, PersistOutcome, StorageConfig, StorageError};

/// Result of a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub matches_written: u32,
    /// Non-ranked, excluded-version, or unresolvable-league matches.
    pub matches_skipped: u32,
    /// Matches already stored in this batch or seen earlier in the same league.
    pub matches_existing: u32,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// What happened to one match id.
enum MatchOutcome {
    Written,
    Skipped,
    Existing,
}

/// Pick `size` players uniformly without replacement, keeping listing order.
/// Every player is kept when there are no more than `size`.
pub fn sample_players<R: Rng + ?Sized>(
    players: Vec<LeagueItem>,
    size: usize,
    rng: &mut R,
) -> Vec<LeagueItem> {
    if players.len() <= size {
        return players;
    }

    let mut picked = rand::seq::index::sample(rng, players.len(), size).into_vec();
    picked.sort_unstable();

    let mut picked = picked.into_iter().peekable();
    players
        .into_iter()
        .enumerate()
        .filter_map(|(idx, player)| {
            if picked.peek() == Some(&idx) {
                picked.next();
                Some(player)
            } else {
                None
            }
        })
        .collect()
}

/// Collects recent ranked matches into a timestamped batch.
pub struct Collector<'a> {
    api: RiotApi<'a>,
    store: MatchStore,
    config: CollectorConfig,
}

impl<'a> Collector<'a> {
    pub fn new(client: &'a RateLimitedClient, storage: &StorageConfig, config: CollectorConfig) -> Self {
        Self {
            api: RiotApi::new(client),
            store: MatchStore::new(storage),
            config,
        }
    }

    /// Collect every configured (region, league) into batch `batch`.
    /// Upstream and payload errors are recorded and skipped; storage errors
    /// abort the run.
    pub async fn run(&self, batch: BatchId) -> Result<CollectReport, SyncError> {
        let start = Instant::now();
        let mut report = CollectReport::default();

        info!(
            "Starting collection into batch {} ({} regions x {} leagues)",
            batch,
            self.config.regions.len(),
            self.config.leagues.len()
        );

        for &region in &self.config.regions {
            for &league in &self.config.leagues {
                self.collect_league(region, league, batch, &mut report).await?;
            }
        }

        report.duration = start.elapsed();
        info!(
            "Collection completed: {} written, {} skipped, {} existing, {} errors in {:?}",
            report.matches_written,
            report.matches_skipped,
            report.matches_existing,
            report.errors.len(),
            report.duration
        );

        Ok(report)
    }

    async fn collect_league(
        &self,
        region: Region,
        league: League,
        batch: BatchId,
        report: &mut CollectReport,
    ) -> Result<(), SyncError> {
        let players = match self.api.ranked_players(region, league).await {
            Ok(players) => players,
            Err(e) => {
                error!("[{}/{}] failed to list players: {}", region, league, e);
                report.errors.push(format!("{}/{}: {}", region, league, e));
                return Ok(());
            }
        };

        let total = players.len();
        let sampled = sample_players(players, self.config.summoners_per_league, &mut rand::thread_rng());
        info!(
            "[{}/{}] sampled {} of {} players",
            region,
            league,
            sampled.len(),
            total
        );

        // Per league: a match shared by two leagues is stored under both.
        let mut seen = HashSet::new();
        for player in sampled {
            let match_ids = match self.player_match_ids(region, &player).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("[{}/{}] skipping player: {}", region, league, e);
                    report.errors.push(format!("{}/{}: {}", region, league, e));
                    continue;
                }
            };

            for match_id in match_ids {
                if !seen.insert(match_id.clone()) {
                    report.matches_existing += 1;
                    continue;
                }

                match self.collect_match(region, league, &match_id, batch).await {
                    Ok(MatchOutcome::Written) => report.matches_written += 1,
                    Ok(MatchOutcome::Skipped) => report.matches_skipped += 1,
                    Ok(MatchOutcome::Existing) => report.matches_existing += 1,
                    Err(SyncError::Storage(e)) => return Err(SyncError::Storage(e)),
                    Err(e) => {
                        warn!("[{}] skipping match: {}", match_id, e);
                        report.errors.push(format!("{}: {}", match_id, e));
                    }
                }
            }
        }

        Ok(())
    }

    async fn player_match_ids(
        &self,
        region: Region,
        player: &LeagueItem,
    ) -> Result<Vec<String>, SyncError> {
        let puuid = match (&player.puuid, &player.summoner_id) {
            (Some(puuid), _) => puuid.clone(),
            (None, Some(summoner_id)) => self.api.summoner(region, summoner_id).await?.puuid,
            (None, None) => return Ok(Vec::new()),
        };

        Ok(self
            .api
            .match_ids(region, &puuid, self.config.matches_per_summoner)
            .await?)
    }

    async fn collect_match(
        &self,
        region: Region,
        league: League,
        match_id: &str,
        batch: BatchId,
    ) -> Result<MatchOutcome, SyncError> {
        let payload = self.api.match_payload(region, match_id).await?;
        let raw: MatchRaw = serde_json::from_value(payload.clone())?;

        if !raw.is_ranked(self.config.ranked_queue_id) {
            info!("[{}] not a ranked game, moving on", match_id);
            return Ok(MatchOutcome::Skipped);
        }

        let release_version = parse_release_version(&raw.info.game_version).ok_or_else(|| {
            SyncError::MalformedReleaseVersion {
                match_id: match_id.to_string(),
                game_version: raw.info.game_version.clone(),
            }
        })?;

        if self.config.is_excluded(&release_version) {
            info!(
                "[{}] version {} is out of scope, moving on",
                match_id, release_version
            );
            return Ok(MatchOutcome::Skipped);
        }

        let key = BatchKey::new(release_version.clone(), region, league);
        if self.store.contains(&key, batch, match_id) {
            return Ok(MatchOutcome::Existing);
        }

        let player_avg_tier = if self.config.resolve_average_league {
            match self.average_league(region, &raw).await {
                Some(avg) => avg,
                None => {
                    info!("[{}] no participant league found, moving on", match_id);
                    return Ok(MatchOutcome::Skipped);
                }
            }
        } else {
            league
        };

        let m = Match {
            top4: derive_top4(&raw)?,
            raw: payload,
            release_version,
            player_avg_tier,
        };

        match self.store.persist(&m, &key, batch) {
            Ok(PersistOutcome::Written) => Ok(MatchOutcome::Written),
            Ok(PersistOutcome::AlreadyExists) => Ok(MatchOutcome::Existing),
            Err(StorageError::MissingMatchId) => Ok(MatchOutcome::Skipped),
            Err(e) => Err(e.into()),
        }
    }

    /// Mean ranked league of a match's participants. Participants whose
    /// league cannot be fetched are left out.
    async fn average_league(&self, region: Region, raw: &MatchRaw) -> Option<League> {
        let mut standings = Vec::new();

        for puuid in &raw.metadata.participants {
            let summoner = match self.api.summoner_by_puuid(region, puuid).await {
                Ok(s) => s,
                Err(e) => {
                    warn!("[{}] participant lookup failed: {}", raw.metadata.match_id, e);
                    continue;
                }
            };
            let Some(summoner_id) = summoner.id else {
                continue;
            };

            match self.api.league_entries(region, &summoner_id).await {
                Ok(entries) => {
                    if let Some(standing) = entries.iter().find_map(|e| e.standing()) {
                        standings.push(standing);
                    }
                }
                Err(e) => {
                    warn!("[{}] league lookup failed: {}", raw.metadata.match_id, e);
                }
            }
        }

        League::average(standings)
    }
}
