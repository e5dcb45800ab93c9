//! Tracker batch runner.
//!
//! Runs one pipeline per invocation and exits; scheduling is left to cron
//! or CI. A run that detects nothing follows `--on-empty`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tracker::config::TrackerConfig;
use tracker::context::{OnEmpty, RunContext};
use tracker::download::{DownloadConfig, DownloadManager};
use tracker::pipelines;

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(about = "Track drylines, the rain belt and heat lows over Africa")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (missing file means built-in defaults)
    #[arg(long, env = "TRACKER_CONFIG", default_value = "config/tracker.yaml", global = true)]
    config: PathBuf,

    /// Model cycle
    #[arg(long, env = "GDAS_CYCLE", default_value = "00", value_parser = ["00", "06", "12", "18"], global = true)]
    cycle: String,

    /// Run date, YYYYMMDD or YYYY-MM-DD (default: today, UTC)
    #[arg(long, env = "TRACKER_DATE", value_parser = parse_date, global = true)]
    date: Option<NaiveDate>,

    /// Africa outline (GeoJSON)
    #[arg(
        long,
        env = "AFRICA_GEOJSON_URL",
        default_value = "https://gist.githubusercontent.com/1310aditya/35b939f63d9bf7fbafb0ab28eb878388/raw/africa.json",
        global = true
    )]
    africa_url: String,

    /// Directory for GeoJSON tiles
    #[arg(long, env = "TILES_DIR", default_value = "tiles", global = true)]
    tiles_dir: PathBuf,

    /// Directory for CSV tables
    #[arg(long, env = "DATABASE_DIR", default_value = "database", global = true)]
    database_dir: PathBuf,

    /// Directory for downloads and the cached Africa outline
    #[arg(long, env = "WORK_DIR", default_value = "work", global = true)]
    work_dir: PathBuf,

    /// What to do when nothing is detected
    #[arg(long, value_enum, default_value_t = OnEmpty::Succeed, global = true)]
    on_empty: OnEmpty,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// CAB, KD and dryline points from GDAS 2 m specific humidity
    Drylines,
    /// Rain belt outline from GDAS 850 hPa specific humidity
    Rainbelt,
    /// Heat lows from GDAS 850 hPa temperature
    HeatLows,
    /// CAB and rain belt outlook from the GEFS ensemble
    Forecast,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Drylines => "drylines",
            Self::Rainbelt => "rainbelt",
            Self::HeatLows => "heat-lows",
            Self::Forecast => "forecast",
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json)?;

    let config = TrackerConfig::load_or_default(&args.config)?;
    let downloader = DownloadManager::new(DownloadConfig {
        request_timeout: Duration::from_secs(config.sources.request_timeout_secs),
        output_dir: args.work_dir.clone(),
    })?;

    let ctx = RunContext {
        config,
        downloader,
        date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
        cycle: args.cycle.clone(),
        tiles_dir: args.tiles_dir.clone(),
        database_dir: args.database_dir.clone(),
        africa_url: args.africa_url.clone(),
        africa_cache: args.work_dir.join("africa.geojson"),
    };

    info!(
        pipeline = args.command.name(),
        date = %ctx.date,
        cycle = %ctx.cycle,
        "Starting tracker run"
    );

    let outcome = match args.command {
        Command::Drylines => pipelines::drylines::run(&ctx).await,
        Command::Rainbelt => pipelines::rainbelt::run(&ctx).await,
        Command::HeatLows => pipelines::heat_lows::run(&ctx).await,
        Command::Forecast => pipelines::forecast::run(&ctx).await,
    }
    .with_context(|| format!("{} run failed", args.command.name()))?;

    let written = outcome.resolve(args.on_empty)?;
    for path in &written {
        info!(path = %path.display(), "Wrote output");
    }
    info!(pipeline = args.command.name(), files = written.len(), "Tracker run complete");

    Ok(())
}
