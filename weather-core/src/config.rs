use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

use crate::{provider::StrategyKind, store::StalePolicy};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_FORECAST_DAYS: u8 = 7;
pub const DEFAULT_WEATHERAPI_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Coordinates behind one fixed region key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WeatherAPI.com key used by the by-city strategy.
    pub api_key: Option<String>,

    /// "city" or "region"; by-city when absent.
    pub default_strategy: Option<String>,

    /// Days requested from the forecast endpoint.
    pub forecast_days: u8,

    pub weatherapi_base_url: String,
    pub open_meteo_base_url: String,

    pub stale_policy: StalePolicy,

    /// Example TOML:
    /// [regions.pakistan]
    /// latitude = 33.6844
    /// longitude = 73.0479
    pub regions: BTreeMap<String, RegionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_strategy: None,
            forecast_days: DEFAULT_FORECAST_DAYS,
            weatherapi_base_url: DEFAULT_WEATHERAPI_BASE_URL.to_string(),
            open_meteo_base_url: DEFAULT_OPEN_METEO_BASE_URL.to_string(),
            stale_policy: StalePolicy::default(),
            regions: default_regions(),
        }
    }
}

fn default_regions() -> BTreeMap<String, RegionConfig> {
    BTreeMap::from([
        (
            "pakistan".to_string(),
            RegionConfig { latitude: 33.6844, longitude: 73.0479 },
        ),
        (
            "saudiArabia".to_string(),
            RegionConfig { latitude: 24.7136, longitude: 46.6753 },
        ),
    ])
}

impl Config {
    /// Return the default strategy as a strongly-typed StrategyKind.
    pub fn default_strategy_kind(&self) -> Result<StrategyKind> {
        match self.default_strategy.as_deref() {
            None => Ok(StrategyKind::City),
            Some(s) => StrategyKind::try_from(s),
        }
    }

    pub fn set_default_strategy(&mut self, kind: StrategyKind) {
        self.default_strategy = Some(kind.as_str().to_string());
    }

    /// Stores the key, treating blank input as "no key".
    pub fn set_api_key(&mut self, api_key: &str) {
        self.api_key = non_blank(Some(api_key.to_string()));
    }

    /// API key from the environment if set, otherwise from the file.
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key_with_override(std::env::var(API_KEY_ENV).ok())
    }

    pub fn api_key_with_override(&self, env_value: Option<String>) -> Option<String> {
        non_blank(env_value).or_else(|| non_blank(self.api_key.clone()))
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        if cfg.forecast_days == 0 {
            return Err(anyhow!("forecast_days must be at least 1"));
        }
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn region_keys(&self) -> Vec<&str> {
        self.regions.keys().map(String::as_str).collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
