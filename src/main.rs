use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use results_engine::config::AppConfig;
use results_engine::recalculate::{JsonlStore, RecalcStatus, Recalculator, SweepReport};
use results_engine::storage::StorageConfig;

#[derive(Parser)]
#[command(name = "results-engine")]
#[command(about = "Recalculates player stats, rating history and tournament standings")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Reference time for rating staleness (YYYY-MM-DD or RFC 3339).
    /// Defaults to the start of the current UTC day.
    #[arg(long)]
    as_of: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate one player's stats and rating history
    RecalculatePlayer {
        #[arg(long)]
        id: i64,

        /// Compute and print without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Recalculate one tournament's standings
    RecalculateTournament {
        #[arg(long)]
        id: i64,

        /// Compute and print without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Recalculate both players and the tournament of a match
    RecalculateMatch {
        #[arg(long)]
        id: i64,

        /// Compute and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Recalculate every player and tournament
    RecalculateAll {
        /// Compute and report without writing
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parse `--as-of`, accepting a bare date (midnight UTC) or a full timestamp.
fn parse_as_of(value: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(value) = value else {
        return Ok(Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc());
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| {
        format!("Invalid --as-of (expected YYYY-MM-DD or RFC 3339): {}", value)
    })?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn status_label(status: RecalcStatus, written: bool) -> &'static str {
    match (status, written) {
        (RecalcStatus::Changed, true) => "updated",
        (RecalcStatus::Changed, false) => "would change",
        (RecalcStatus::Unchanged, _) => "unchanged",
    }
}

fn finish_sweep(report: SweepReport) -> Result<()> {
    println!(
        "{} changed, {} unchanged, {} failed ({} total) in {:?}",
        report.changed,
        report.unchanged,
        report.failed,
        report.total(),
        report.duration
    );
    for error in &report.errors {
        eprintln!("  {}", error);
    }
    if !report.is_success() {
        bail!("{} recalculations failed", report.failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }

    // Initialize tracing
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let (json_layer, text_layer) = if cli.json_logs {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Starting results-engine v{}", env!("CARGO_PKG_VERSION"));

    let as_of = parse_as_of(cli.as_of.as_deref())?;
    tracing::info!("Data dir {:?}, as of {}", config.data_dir, as_of);

    let store = Arc::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));
    let recalculator = Recalculator::new(store, &config, as_of);

    match cli.command {
        Commands::RecalculatePlayer { id, dry_run } => {
            let result = recalculator
                .with_dry_run(dry_run)
                .recalculate_player(id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result.document)?);
            println!(
                "Player {}: {}",
                id,
                status_label(result.status, result.written)
            );
        }

        Commands::RecalculateTournament { id, dry_run } => {
            let result = recalculator
                .with_dry_run(dry_run)
                .recalculate_tournament_standings(id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result.document)?);
            println!(
                "Tournament {}: {}",
                id,
                status_label(result.status, result.written)
            );
        }

        Commands::RecalculateMatch { id, dry_run } => {
            let report = recalculator
                .with_dry_run(dry_run)
                .recalculate_match(id)
                .await?;
            finish_sweep(report)?;
        }

        Commands::RecalculateAll { dry_run } => {
            let report = recalculator.with_dry_run(dry_run).recalculate_all().await?;
            finish_sweep(report)?;
        }
    }

    Ok(())
}
