use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chart_probe::{analyze_stage, SceneNode};
use seatlens::config::{load_configuration, SeatlensConfig};
use seatlens::fixture::{FixtureHost, PageScript};
use seatlens::pipeline::ProbePipeline;
use seatlens::presentation::ToastPayload;
use seatlens_bridge::MessageChannel;
use seatlens_core_types::SeatReport;
use session_resolver::{HoverTarget, PageCapture, SessionResolver};

/// Seatlens - hover-triggered seat-availability probe
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a serialized stage dump and print seat stats
    Analyze {
        /// Scene-graph dump file (stage.toJSON() shape)
        stage: PathBuf,
    },
    /// Resolve a hover against a page capture and print the seat-layout meta
    Resolve {
        /// Page capture file (url + script bodies)
        #[arg(long)]
        capture: PathBuf,
        /// Hover target file (text + ancestor chain)
        #[arg(long)]
        hover: PathBuf,
    },
    /// Run the full probe pipeline against scripted page fixtures
    Probe {
        #[arg(long)]
        capture: PathBuf,
        /// Fixture file: canonical URL -> scripted page behavior
        #[arg(long)]
        fixtures: PathBuf,
        #[arg(long)]
        hover: PathBuf,
    },
    /// Print the effective configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    info!("Starting seatlens v{}", env!("CARGO_PKG_VERSION"));
    let config = load_configuration(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Analyze { stage } => cmd_analyze(&stage),
        Commands::Resolve { capture, hover } => cmd_resolve(&capture, &hover, &config),
        Commands::Probe {
            capture,
            fixtures,
            hover,
        } => cmd_probe(&capture, &fixtures, &hover, &config).await,
        Commands::Info => cmd_info(&config),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("Command failed: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn cmd_analyze(stage_path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(stage_path)
        .with_context(|| format!("reading {}", stage_path.display()))?;
    let stage = SceneNode::from_json(&raw).context("parsing stage dump")?;
    match analyze_stage(&stage) {
        Some(stats) => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        None => bail!("no seat pairs found in stage dump"),
    }
}

fn cmd_resolve(capture_path: &Path, hover_path: &Path, config: &SeatlensConfig) -> Result<()> {
    let capture: PageCapture = read_json(capture_path)?;
    let hover: HoverTarget = read_json(hover_path)?;
    let resolver = SessionResolver::new(&capture);
    let meta = resolver
        .resolve(&hover)
        .context("hover did not resolve to a seat-layout url")?;
    let canonical_url = meta.canonical_url(&config.site_host);
    let output = serde_json::json!({
        "meta": meta,
        "canonical_url": canonical_url,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_probe(
    capture_path: &Path,
    fixtures_path: &Path,
    hover_path: &Path,
    config: &SeatlensConfig,
) -> Result<()> {
    let capture: PageCapture = read_json(capture_path)?;
    let fixtures: HashMap<String, PageScript> = read_json(fixtures_path)?;
    let hover: HoverTarget = read_json(hover_path)?;

    let outer = MessageChannel::new(32);
    let host = FixtureHost::new(
        fixtures,
        Arc::clone(&outer),
        &config.site_host,
        config.poll_interval(),
    );
    let pipeline = ProbePipeline::new(&capture, host, outer, config);

    println!("{}", ToastPayload::from(&SeatReport::Loading).to_json());
    match pipeline.hover(&hover).await {
        Some(report) => println!("{}", ToastPayload::from(&report).to_json()),
        None => println!("null"),
    }
    Ok(())
}

fn cmd_info(config: &SeatlensConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    println!(
        "probe timeout {}, cache ttl {}, poll interval {}",
        humantime::format_duration(config.probe_timeout()),
        humantime::format_duration(config.cache_ttl()),
        humantime::format_duration(config.poll_interval()),
    );
    Ok(())
}
