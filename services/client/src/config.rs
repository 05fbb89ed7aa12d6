//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use movie_discovery_core::watch_providers::RegionPriority;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub api_token: String,
    pub image_base: String,
    pub language: String,
    pub favorites_path: PathBuf,
    pub search_debounce: Duration,
    pub watch_regions: RegionPriority,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Catalog API ---
        let api_token = lookup("TMDB_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("TMDB_API_TOKEN".to_string()))?;
        let api_base = lookup("TMDB_API_BASE")
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string())
            .trim_end_matches('/')
            .to_string();
        let image_base = lookup("TMDB_IMAGE_BASE")
            .unwrap_or_else(|| "https://image.tmdb.org/t/p/w500".to_string())
            .trim_end_matches('/')
            .to_string();
        let language = lookup("TMDB_LANGUAGE").unwrap_or_else(|| "en-US".to_string());

        // --- Local Persistence ---
        let favorites_path = lookup("FAVORITES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./favorites.json"));

        // --- Behaviour ---
        let search_debounce = match lookup("SEARCH_DEBOUNCE_MS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|e| {
                ConfigError::InvalidValue("SEARCH_DEBOUNCE_MS".to_string(), e.to_string())
            })?,
            None => movie_discovery_core::search::SEARCH_DEBOUNCE,
        };

        let watch_regions = match lookup("WATCH_REGIONS") {
            Some(raw) => RegionPriority::new(
                raw.split(',')
                    .map(|code| code.trim().to_uppercase())
                    .filter(|code| !code.is_empty()),
            )
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "WATCH_REGIONS".to_string(),
                    "at least one region code is required".to_string(),
                )
            })?,
            None => RegionPriority::default(),
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base,
            api_token,
            image_base,
            language,
            favorites_path,
            search_debounce,
            watch_regions,
            log_level,
        })
    }
}
