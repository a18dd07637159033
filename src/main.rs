use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use top4_stats::api::{build_router, state::AppState};
use top4_stats::config::AppConfig;
use top4_stats::fetch::RateLimitedClient;
use top4_stats::parse_duration;
use top4_stats::storage::StorageConfig;
use top4_stats::sync::{now_millis, AggregateReport, Aggregator, CollectReport, Collector};

#[derive(Parser)]
#[command(name = "top4-stats")]
#[command(about = "Rate-limited TFT match ingestion and top-4 frequency statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the configuration file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect recent ranked matches into a new batch
    Collect,

    /// Rebuild the published statistics from stored batches
    Aggregate,

    /// Collect then aggregate
    Run {
        /// Repeat at interval until interrupted
        #[arg(long)]
        watch: bool,

        /// Interval between runs (e.g., "6h", "30m")
        #[arg(long, default_value = "6h")]
        interval: String,
    },

    /// Rebuild params.json from the published documents
    Params,

    /// Start the API server
    Serve {
        /// Bind address (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        AppConfig::default()
    };

    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_tracing(level: &str, json: bool) {
    // RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn collect(config: &AppConfig, client: &RateLimitedClient) -> Result<CollectReport> {
    let storage = StorageConfig::new(config.data_dir.clone());
    let collector = Collector::new(client, &storage, config.collector.clone());
    let report = collector.run(now_millis()).await?;

    println!("\n=== Collection Results ===");
    println!("Matches written:  {}", report.matches_written);
    println!("Matches skipped:  {}", report.matches_skipped);
    println!("Already stored:   {}", report.matches_existing);
    println!("Duration:         {:?}", report.duration);
    print_errors(&report.errors);
    Ok(report)
}

fn aggregate(config: &AppConfig) -> Result<AggregateReport> {
    let storage = StorageConfig::new(config.data_dir.clone());
    let aggregator = Aggregator::new(&storage, &config.collector, config.aggregator.clone());
    let report = aggregator.run(now_millis())?;

    println!("\n=== Aggregation Results ===");
    println!("Tuples:           {}", report.tuples_aggregated);
    println!("Documents:        {}", report.documents_written);
    println!("Unpublished:      {}", report.documents_removed);
    println!("Matches read:     {}", report.matches_read);
    println!("Batches evicted:  {}", report.batches_evicted);
    println!("Duplicates:       {}", report.duplicates_removed);
    println!("Params indexed:   {}", report.params_indexed);
    println!("Duration:         {:?}", report.duration);
    print_errors(&report.errors);
    Ok(report)
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("\nErrors:");
    for err in errors {
        println!("  - {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting top4-stats v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Collect => {
            let client = RateLimitedClient::new(config.api.client_config()?)?;
            collect(&config, &client).await?;
        }
        Commands::Aggregate => {
            aggregate(&config)?;
        }
        Commands::Run {
            watch,
            interval: interval_str,
        } => {
            let interval = parse_duration(&interval_str)
                .filter(|d| !d.is_zero())
                .with_context(|| format!("invalid --interval {:?}", interval_str))?;
            let client = RateLimitedClient::new(config.api.client_config()?)?;

            loop {
                collect(&config, &client).await?;
                aggregate(&config)?;

                if !watch {
                    break;
                }

                tracing::info!("Next run in {} ({:?})", interval_str, interval);
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping");
                        break;
                    }
                }
            }
        }
        Commands::Params => {
            let storage = StorageConfig::new(config.data_dir.clone());
            let aggregator =
                Aggregator::new(&storage, &config.collector, config.aggregator.clone());
            let params = aggregator.rebuild_params()?;
            println!("Indexed {} published documents", params.len());
        }
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            let state = AppState::new(StorageConfig::new(config.data_dir.clone()));
            let app = build_router(state, &server);
            let addr = format!("{}:{}", server.host, server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_parses_run_watch() {
        let cli = Cli::try_parse_from([
            "top4-stats",
            "--data-dir",
            "/tmp/lake",
            "run",
            "--watch",
            "--interval",
            "30m",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/lake")));
        match cli.command {
            Commands::Run { watch, interval } => {
                assert!(watch);
                assert_eq!(parse_duration(&interval), Some(Duration::from_secs(1800)));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let cli = Cli::try_parse_from([
            "top4-stats",
            "--config",
            "/nonexistent/top4-stats.toml",
            "--log-level",
            "debug",
            "aggregate",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.aggregator.match_cap, 500);
    }
}
