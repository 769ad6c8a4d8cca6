use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::model::Coordinate;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Persisted answer to the location permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Consent {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

/// Coordinate stored in the config file, resolved as the "device position".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HomeCoordinate {
    pub lat: f64,
    pub lon: f64,
}

impl From<HomeCoordinate> for Coordinate {
    fn from(home: HomeCoordinate) -> Self {
        Coordinate::new(home.lat, home.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    #[serde(default)]
    pub consent: Consent,

    /// Example TOML:
    /// [location.home]
    /// lat = -6.2
    /// lon = 106.8
    pub home: Option<HomeCoordinate>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OpenWeatherMap API key; the environment variable takes precedence.
    pub api_key: Option<String>,

    #[serde(default)]
    pub location: LocationConfig,
}

fn resolve_api_key(env_value: Option<String>, configured: Option<&str>) -> Option<String> {
    env_value
        .filter(|key| !key.is_empty())
        .or_else(|| configured.map(str::to_string))
}

impl Config {
    /// API key after applying the environment override.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    /// API key, or an actionable error. Callers validate at startup so a
    /// missing credential never turns into a malformed request later.
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeatherMap API key configured.\n\
                 Hint: run `seeweather configure` and enter your API key, \
                 or set the {API_KEY_ENV} environment variable."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Record the user's answer to the location consent prompt.
    pub fn record_consent(&mut self, consent: Consent) {
        self.location.consent = consent;
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

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
        let dirs = ProjectDirs::from("dev", "seeweather", "seeweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
