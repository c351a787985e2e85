//! Client configuration
//!
//! Resolution order, later wins:
//! 1. Built-in defaults
//! 2. `~/.vaikerai/config.toml` (only via [`ClientConfig::load`])
//! 3. `VAIKERAI_API_TOKEN`, `VAIKERAI_BASE_URL`, `VAIKERAI_POLL_INTERVAL`
//!
//! The environment is read once, when the configuration is built.

use crate::errors::{Result, VaikerError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.vaikerai.com";

/// Default interval between job status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest interval between job status polls; smaller values are raised
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default timeout for non-streaming requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_TOKEN: &str = "VAIKERAI_API_TOKEN";
pub const ENV_BASE_URL: &str = "VAIKERAI_BASE_URL";
pub const ENV_POLL_INTERVAL: &str = "VAIKERAI_POLL_INTERVAL";

/// Client configuration, fixed once a client is built
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub poll_interval: Duration,
    /// Extra headers, applied after the defaults so they can override them
    pub headers: BTreeMap<String, String>,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// On-disk form of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    /// Seconds, fractional allowed
    #[serde(default)]
    poll_interval: Option<f64>,
    #[serde(default)]
    timeout: Option<f64>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            headers: BTreeMap::new(),
            user_agent: format!("vaikerai-rust/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load `~/.vaikerai/config.toml` when present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let mut config = Self::default();
        config.api_token = file.api_token;
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = file.poll_interval {
            config.poll_interval =
                parse_seconds("poll_interval", &secs.to_string())?.max(MIN_POLL_INTERVAL);
        }
        if let Some(secs) = file.timeout {
            config.timeout = parse_seconds("timeout", &secs.to_string())?;
        }
        config.headers = file.headers;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".vaikerai").join("config.toml"))
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            self.api_token = Some(token);
        }

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            self.base_url = base_url;
        }

        if let Some(raw) = lookup(ENV_POLL_INTERVAL).filter(|v| !v.is_empty()) {
            self.poll_interval = parse_seconds(ENV_POLL_INTERVAL, &raw)?.max(MIN_POLL_INTERVAL);
        }

        Ok(self)
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn parse_seconds(field: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| VaikerError::Config(format!("{} must be a number of seconds, got '{}'", field, raw)))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(VaikerError::Config(format!(
            "{} must be a non-negative number of seconds, got '{}'",
            field, raw
        )));
    }

    Ok(Duration::from_secs_f64(secs))
}
