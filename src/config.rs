//! Configuration loader for the `silo-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Keeping every `env::var` call here means the
//! fetcher, poller and routes only ever see a typed [`Config`].
//!
use std::{env, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Base URL of the silo inventory REST API (no trailing slash).
    pub api_url: String,

    /// Seconds between background refreshes.
    pub poll_interval_secs: u32,

    /// Per-request timeout for upstream calls, in seconds.
    pub fetch_timeout_secs: u32,

    /// Port the dashboard HTTP server binds to.
    pub listen_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SILO_API_URL` – silo inventory API base URL
///
/// Optional:
/// - `POLL_INTERVAL_SECS` – refresh period (default: 30)
/// - `FETCH_TIMEOUT_SECS` – upstream request timeout (default: 10)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = require_env!("SILO_API_URL");
    let poll_interval_secs = parse_env_u32!("POLL_INTERVAL_SECS", 30);
    let fetch_timeout_secs = parse_env_u32!("FETCH_TIMEOUT_SECS", 10);
    let listen_port = parse_env_u32!("LISTEN_PORT", 8080);

    Config::new(api_url, poll_interval_secs, fetch_timeout_secs, listen_port)
}

impl Config {
    // ---
    /// Validate raw values and build a configuration snapshot.
    pub fn new(
        api_url: impl Into<String>,
        poll_interval_secs: u32,
        fetch_timeout_secs: u32,
        listen_port: u32,
    ) -> Result<Config> {
        // ---
        let api_url = api_url.into().trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(anyhow!("SILO_API_URL must not be empty"));
        }
        if poll_interval_secs == 0 {
            return Err(anyhow!("POLL_INTERVAL_SECS must be greater than zero"));
        }
        if fetch_timeout_secs == 0 {
            return Err(anyhow!("FETCH_TIMEOUT_SECS must be greater than zero"));
        }
        let listen_port = u16::try_from(listen_port)
            .map_err(|_| anyhow!("Invalid LISTEN_PORT: {} is out of range", listen_port))?;

        Ok(Config {
            api_url,
            poll_interval_secs,
            fetch_timeout_secs,
            listen_port,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.fetch_timeout_secs))
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SILO_API_URL       : {}", self.api_url);
        tracing::info!("  POLL_INTERVAL_SECS : {}", self.poll_interval_secs);
        tracing::info!("  FETCH_TIMEOUT_SECS : {}", self.fetch_timeout_secs);
        tracing::info!("  LISTEN_PORT        : {}", self.listen_port);
    }
}
