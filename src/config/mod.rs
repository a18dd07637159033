//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::calculate::MergeOptions;
use crate::fetch::ClientConfig;
use crate::models::{League, Region, RANKED_QUEUE_ID};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Header the key is sent in
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Pause after every successful request, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Rate-limit retries per request (0 = retry forever)
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

fn default_api_key_header() -> String {
    "X-Riot-Token".to_string()
}

fn default_cooldown_ms() -> u64 {
    500
}

fn default_max_rate_limit_retries() -> u32 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("top4-stats/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_key_header: default_api_key_header(),
            cooldown_ms: default_cooldown_ms(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Client configuration with the key read from the environment.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))?;

        Ok(self.client_config_with_key(api_key.trim().to_string()))
    }

    pub fn client_config_with_key(&self, api_key: String) -> ClientConfig {
        ClientConfig {
            api_key_header: self.api_key_header.clone(),
            api_key,
            cooldown: Duration::from_millis(self.cooldown_ms),
            max_rate_limit_retries: match self.max_rate_limit_retries {
                0 => None,
                n => Some(n),
            },
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Regions collected, in order
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    /// Leagues collected per region, in order
    #[serde(default = "default_leagues")]
    pub leagues: Vec<League>,

    /// Release versions never collected nor aggregated
    #[serde(default = "default_excluded_versions")]
    pub excluded_versions: Vec<String>,

    /// Players sampled per league
    #[serde(default = "default_summoners_per_league")]
    pub summoners_per_league: usize,

    /// Recent match ids requested per player
    #[serde(default = "default_matches_per_summoner")]
    pub matches_per_summoner: usize,

    #[serde(default = "default_ranked_queue_id")]
    pub ranked_queue_id: u32,

    /// Derive each match's league from its participants' ranked entries
    /// instead of the league it was collected from
    #[serde(default)]
    pub resolve_average_league: bool,
}

fn default_regions() -> Vec<Region> {
    vec![Region::Na, Region::Eune, Region::Euw, Region::Kr]
}

fn default_leagues() -> Vec<League> {
    vec![
        League::Challenger,
        League::Grandmaster,
        League::Master,
        League::Diamond,
    ]
}

fn default_excluded_versions() -> Vec<String> {
    ["13.6", "13.5", "13.4", "13.3", "13.2", "13.1", "12.23"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_summoners_per_league() -> usize {
    10
}

fn default_matches_per_summoner() -> usize {
    20
}

fn default_ranked_queue_id() -> u32 {
    RANKED_QUEUE_ID
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            leagues: default_leagues(),
            excluded_versions: default_excluded_versions(),
            summoners_per_league: default_summoners_per_league(),
            matches_per_summoner: default_matches_per_summoner(),
            ranked_queue_id: default_ranked_queue_id(),
            resolve_average_league: false,
        }
    }
}

impl CollectorConfig {
    pub fn is_excluded(&self, version: &str) -> bool {
        self.excluded_versions.iter().any(|v| v == version)
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Matches read per (version, region, league) before older batches are evicted
    #[serde(default = "default_match_cap")]
    pub match_cap: usize,

    /// Upper bound on batches kept per (version, region, league) (0 = no bound)
    #[serde(default)]
    pub retained_batches: usize,

    /// Neighbors kept per entity (0 = no limit)
    #[serde(default = "default_top_n")]
    pub neighbor_limit: usize,

    /// Items kept per unit (0 = no limit)
    #[serde(default = "default_top_n")]
    pub item_limit: usize,
}

fn default_match_cap() -> usize {
    500
}

fn default_top_n() -> usize {
    10
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            match_cap: default_match_cap(),
            retained_batches: 0,
            neighbor_limit: default_top_n(),
            item_limit: default_top_n(),
        }
    }
}

impl AggregatorConfig {
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::published(self.neighbor_limit, self.item_limit)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub aggregator: AggregatorConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            api: ApiConfig::default(),
            collector: CollectorConfig::default(),
            aggregator: AggregatorConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.collector.regions.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one region must be configured".to_string(),
            ));
        }

        if self.collector.leagues.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one league must be configured".to_string(),
            ));
        }

        if self.collector.summoners_per_league == 0 || self.collector.matches_per_summoner == 0 {
            return Err(ConfigError::ValidationError(
                "Summoner and match sample sizes must be greater than 0".to_string(),
            ));
        }

        if self.aggregator.match_cap == 0 {
            return Err(ConfigError::ValidationError(
                "Match cap must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
