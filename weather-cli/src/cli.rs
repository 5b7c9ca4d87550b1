use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{
    Config, HttpTransport, Orchestrator, StalePolicy, Status, StrategyKind, WeatherStore,
    provider::strategy_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com key and the default lookup mode.
    Configure,

    /// Show weather for a city name or a fixed region key.
    Show {
        /// City name (city mode) or region key (region mode).
        location: String,

        /// Lookup mode: "city" or "region". Defaults to the configured mode.
        #[arg(long)]
        mode: Option<String>,

        /// Number of forecast days to request.
        #[arg(long)]
        days: Option<u8>,

        /// Print the final snapshot as JSON.
        #[arg(long)]
        json: bool,

        /// Ignore completions of superseded requests.
        #[arg(long)]
        latest_wins: bool,
    },

    /// List the fixed region keys usable with `--mode region`.
    Regions,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                location,
                mode,
                days,
                json,
                latest_wins,
            } => show(&location, mode.as_deref(), days, json, latest_wins).await,
            Command::Regions => {
                let config = Config::load()?;
                for key in config.region_keys() {
                    println!("{key}");
                }
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(&api_key);
    }

    let kind = Select::new("Default lookup mode:", StrategyKind::all().to_vec())
        .prompt()
        .context("Failed to read lookup mode")?;
    config.set_default_strategy(kind);

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    location: &str,
    mode: Option<&str>,
    days: Option<u8>,
    json: bool,
    latest_wins: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(days) = days {
        if days == 0 {
            bail!("--days must be at least 1");
        }
        config.forecast_days = days;
    }
    if latest_wins {
        config.stale_policy = StalePolicy::LatestRequestWins;
    }

    let kind = match mode {
        Some(mode) => StrategyKind::try_from(mode)?,
        None => config.default_strategy_kind()?,
    };

    let store = Arc::new(WeatherStore::with_policy(config.stale_policy));
    if !json {
        let label = location.to_string();
        store.subscribe(move |snap| {
            if snap.is_loading() {
                eprintln!("Loading weather for {label}...");
            }
        });
    }

    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        Arc::new(HttpTransport::new()),
        strategy_from_config(kind, &config)?,
    );
    tracing::debug!(
        strategy = %orchestrator.strategy().kind(),
        policy = ?store.policy(),
        location,
        "dispatching weather fetch"
    );
    orchestrator.dispatch_fetch(location).await;

    let snapshot = store.read();
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    }

    match snapshot.status {
        Status::Failed => Err(anyhow!(
            "{}",
            snapshot.error.as_deref().unwrap_or("Failed to fetch weather data")
        )),
        _ if json => Ok(()),
        _ => {
            print!("{}", render::snapshot(&snapshot, kind, location)?);
            Ok(())
        }
    }
}
