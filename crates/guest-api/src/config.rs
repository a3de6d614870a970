//! Configuration for the guest API.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Country dataset configuration
    #[serde(default)]
    pub countries: CountriesConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Add an `X-Debug-Time` header to every response
    #[serde(default)]
    pub debug_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the table snapshots
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, everything is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountriesConfig {
    /// Dataset used to seed the directory; the bundled one when unset
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per minute across all `/v1` routes
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            debug_headers: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            persist: true,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

fn default_per_minute() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_environment(config::Environment::default())
    }

    /// Build configuration from an environment source.
    pub fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.separator("__").try_parsing(false))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
