//! Sprout daemon: entry point for running the verification engine.

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use sprout_node::{EngineConfig, SproutNode};
use sprout_nullables::{NullClock, NullFrameClassifier, NullStore};
use sprout_types::{Clock, SystemClock, UserId};
use sprout_utils::LogFormat;
use sprout_verification::Submission;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sprout-daemon", about = "Sprout verification & reward engine")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SPROUT_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the evidence classifier.
    #[arg(long, env = "SPROUT_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    /// Base URL of the satellite vegetation service.
    #[arg(long, env = "SPROUT_SATELLITE_URL")]
    satellite_url: Option<String>,

    /// Base URL of the minting gateway.
    #[arg(long, env = "SPROUT_MINT_URL")]
    mint_url: Option<String>,

    /// Collect Prometheus metrics and print them on exit.
    #[arg(long, env = "SPROUT_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SPROUT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SPROUT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Feed recorded submissions through the engine and print the reports.
    Replay {
        /// JSON file with `users`, `plants` and `submissions`.
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the merged configuration as TOML.
    Show,
}

#[derive(Deserialize)]
struct ReplayInput {
    #[serde(default)]
    users: Vec<ReplayUser>,
    #[serde(default)]
    plants: Vec<ReplayPlant>,
    #[serde(default)]
    submissions: Vec<ReplayEntry>,
}

#[derive(Deserialize)]
struct ReplayUser {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ReplayPlant {
    owner: String,
    id: String,
    species: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Deserialize)]
struct ReplayEntry {
    /// Unix seconds at which the submission arrived.
    at: u64,
    #[serde(flatten)]
    submission: Submission,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &cli.classifier_url {
        config.classifier_url = Some(url.clone());
    }
    if let Some(url) = &cli.satellite_url {
        config.satellite_url = Some(url.clone());
    }
    if let Some(url) = &cli.mint_url {
        config.mint_url = Some(url.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.enable_metrics |= cli.metrics;
    config.validate()?;
    Ok(config)
}

async fn replay(config: EngineConfig, input: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let input: ReplayInput = serde_json::from_str(&raw).context("parsing replay input")?;

    let start = input
        .submissions
        .iter()
        .map(|e| e.at)
        .min()
        .unwrap_or_else(|| SystemClock.now().as_secs());
    let clock = Arc::new(NullClock::new(start));
    let node = SproutNode::new(
        config,
        Arc::new(NullStore::new()),
        clock.clone(),
        Arc::new(NullFrameClassifier),
    )?;

    for user in &input.users {
        node.register_user(&user.id, user.display_name.clone())?;
    }
    for plant in &input.plants {
        node.register_plant(&plant.owner, &plant.id, &plant.species, plant.location.as_deref())?;
    }
    tracing::info!(
        users = input.users.len(),
        plants = input.plants.len(),
        submissions = input.submissions.len(),
        "replaying submissions"
    );

    let mut results = Vec::with_capacity(input.submissions.len());
    for entry in input.submissions {
        clock.set(entry.at);
        let plant = entry.submission.plant_id.clone();
        match node.submit(entry.submission).await {
            Ok(report) => results.push(serde_json::to_value(&report)?),
            Err(e) => {
                tracing::warn!(plant = %plant, error = %e, "submission refused");
                results.push(json!({ "plant_id": plant, "error": e.to_string() }));
            }
        }
    }
    let mints = node.finish_mints().await;

    let mut ledgers = Vec::with_capacity(input.users.len());
    for user in &input.users {
        let id = UserId::parse(user.id.as_str())?;
        ledgers.push(serde_json::to_value(node.get_ledger_state(&id)?)?);
    }

    let output = json!({
        "results": results,
        "mints": mints,
        "ledgers": ledgers,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(metrics) = node.metrics() {
        eprintln!("{}", metrics.encode()?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    config.init_logging()?;

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Show => print!("{}", config.to_toml_string()?),
        },
        Command::Replay { input } => {
            tracing::info!(
                classifier = config.classifier_url.as_deref().unwrap_or("off"),
                satellite = config.satellite_url.as_deref().unwrap_or("off"),
                mint = config.mint_url.as_deref().unwrap_or("off"),
                "starting Sprout engine"
            );
            replay(config, input).await?;
            tracing::info!("Sprout daemon exited cleanly");
        }
    }

    Ok(())
}
