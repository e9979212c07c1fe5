//! Configuration module for the fetch tool

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub throttle: ThrottleSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Printful API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub access_token: Option<String>,
}

/// Request pacing and rate-limit recovery
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Minimum spacing between provider requests, in milliseconds
    pub request_delay_ms: u64,
    /// Fixed wait after an HTTP 429 before retrying, in seconds
    pub rate_limit_backoff_secs: u64,
    /// How many times a 429'd request is retried before giving up
    pub max_rate_limit_retries: u32,
}

/// Mockup generation task polling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

/// Export bundle output
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with PODFETCH_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    ///
    /// The Printful token additionally falls back to the bare
    /// `PRINTFUL_API_KEY` variable when no prefixed value is set.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides (gitignored)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables (PODFETCH_THROTTLE__REQUEST_DELAY_MS, etc.)
            .add_source(
                Environment::with_prefix("PODFETCH")
                    .separator("__")
                    .try_parsing(true)
            );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        if settings.api.access_token.is_none() {
            settings.api.access_token = std::env::var("PRINTFUL_API_KEY")
                .ok()
                .filter(|key| !key.is_empty());
        }
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings::default(),
            throttle: ThrottleSettings::default(),
            polling: PollingSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: "https://api.printful.com".to_string(),
            access_token: None,
        }
    }
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        ThrottleSettings {
            request_delay_ms: 500,
            rate_limit_backoff_secs: 5,
            max_rate_limit_retries: 3,
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        PollingSettings {
            interval_secs: 2,
            max_attempts: 30,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            output_dir: PathBuf::from("exports"),
        }
    }
}
