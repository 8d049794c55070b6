//! Configuration loading for drop-relay.
//!
//! Configuration is loaded from a TOML file (default: `drop-relay.toml`).

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for drop-relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Upstream keyserver configuration.
    pub keyserver: KeyserverConfig,
    /// Request authentication configuration.
    pub auth: AuthConfig,
    /// Retention sweeper configuration.
    pub retention: RetentionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server (default: 0.0.0.0:8787).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
    /// Maximum encrypted payload size in bytes (default: 1MB).
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

/// Upstream keyserver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyserverConfig {
    /// Base URL of the VKS keyserver (default: keys.openpgp.org).
    #[serde(default = "default_keyserver_url")]
    pub url: String,
    /// How long a cached key validation stays fresh, in seconds (default: 600).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Timeout for a single keyserver fetch, in seconds (default: 10).
    /// A fetch must never block a request indefinitely.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// Request authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Maximum allowed distance between a request's claimed timestamp and
    /// the server clock, in seconds (default: 300).
    #[serde(default = "default_timestamp_skew")]
    pub timestamp_skew_secs: i64,
}

/// Retention sweeper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Messages older than this many seconds are swept (default: 7 days).
    #[serde(default = "default_retention_window")]
    pub window_secs: u64,
    /// Sweep interval in seconds (default: 24 hours).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Enable the sweeper task (default: true).
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("drop-relay.db")
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024 // 1MB
}

fn default_keyserver_url() -> String {
    "https://keys.openpgp.org".to_string()
}

fn default_cache_ttl() -> u64 {
    600 // 10 minutes
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_timestamp_skew() -> i64 {
    300
}

fn default_retention_window() -> u64 {
    7 * 24 * 60 * 60 // 7 days in seconds
}

fn default_sweep_interval() -> u64 {
    24 * 60 * 60 // 24 hours
}

fn default_retention_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: default_bind_address(),
            },
            storage: StorageConfig {
                database: default_database_path(),
                max_payload_bytes: default_max_payload_bytes(),
            },
            keyserver: KeyserverConfig {
                url: default_keyserver_url(),
                cache_ttl_secs: default_cache_ttl(),
                fetch_timeout_secs: default_fetch_timeout(),
            },
            auth: AuthConfig {
                timestamp_skew_secs: default_timestamp_skew(),
            },
            retention: RetentionConfig {
                window_secs: default_retention_window(),
                sweep_interval_secs: default_sweep_interval(),
                enabled: default_retention_enabled(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
