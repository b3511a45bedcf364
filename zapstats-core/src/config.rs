//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/zapstats/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/zapstats/` (~/.config/zapstats/)
//! - State/Logs: `$XDG_STATE_HOME/zapstats/` (~/.local/state/zapstats/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Message feed (hosted backend) configuration
    #[serde(default)]
    pub feed: FeedConfig,

    /// HTTP serving configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Message feed configuration
///
/// Points the engine at the hosted backend's PostgREST endpoint that
/// serves the flat message log.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Backend base URL (e.g., `https://project.example.co`)
    pub base_url: Option<String>,

    /// Service API key sent as `apikey` and bearer token
    pub api_key: Option<String>,

    /// Table holding the message log
    #[serde(default = "default_feed_table")]
    pub table: String,

    /// Records fetched per page (max 1000)
    #[serde(default = "default_feed_page_size")]
    pub page_size: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,

    /// Trailing ingestion window in days
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            table: default_feed_table(),
            page_size: default_feed_page_size(),
            timeout_secs: default_feed_timeout(),
            window_days: default_window_days(),
        }
    }
}

impl FeedConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_none() {
            return Err(Error::Config("feed.base_url is required".to_string()));
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err(Error::Config(
                "feed.page_size must be between 1 and 1000".to_string(),
            ));
        }
        if self.window_days < 1 {
            return Err(Error::Config(
                "feed.window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_feed_table() -> String {
    "mensagens".to_string()
}

fn default_feed_page_size() -> usize {
    1000
}

fn default_feed_timeout() -> u64 {
    30
}

fn default_window_days() -> i64 {
    365
}

/// HTTP serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bearer token the dashboard must present; requests are not gated
    /// when unset (trusted/dev deployments)
    pub service_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            service_token: None,
        }
    }
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8787
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/zapstats/config.toml` (~/.config/zapstats/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("zapstats").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/zapstats/` (~/.local/state/zapstats/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("zapstats")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/zapstats/zapstats.log` (~/.local/state/zapstats/zapstats.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("zapstats.log")
    }
}
