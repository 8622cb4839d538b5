/// Application configuration management
/// Stores user preferences in ~/.config/dockmon/config.toml

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::constants::*;

/// Environment variable that overrides the configured backend URL
pub const API_URL_ENV: &str = "DOCKMON_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit backend base URL; wins over `origin`
    pub api_url: Option<String>,
    /// Origin of a web dashboard to mirror (dev ports map to the local backend)
    pub origin: Option<String>,
    pub metrics_interval_secs: Option<u64>,
    pub inventory_interval_secs: Option<u64>,
    pub stats_interval_secs: Option<u64>,
    pub log_refresh_interval_secs: Option<u64>,
    pub log_tail_interval_secs: Option<u64>,
    pub log_tail_lines: Option<usize>,
    pub alert_threshold: Option<f64>,
    pub request_timeout_secs: Option<u64>,
}

/// Timer periods used by the pollers and the log viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub metrics: Duration,
    pub inventory: Duration,
    pub stats: Duration,
    pub log_refresh: Duration,
    pub log_tail: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            metrics: METRICS_INTERVAL,
            inventory: INVENTORY_INTERVAL,
            stats: STATS_INTERVAL,
            log_refresh: LOG_REFRESH_INTERVAL,
            log_tail: LOG_TAIL_INTERVAL,
        }
    }
}

/// Resolved connection settings, built once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl AppConfig {
    /// Directory holding config.toml and the TUI log files
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine the user config directory"))?;
        Ok(base.join("dockmon"))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location (missing file = defaults)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Apply the environment override and an optional CLI flag, in that order
    pub fn with_overrides(mut self, env_api_url: Option<String>, cli_api_url: Option<String>) -> Self {
        if let Some(url) = env_api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(url) = cli_api_url {
            self.api_url = Some(url);
        }
        self
    }

    pub fn intervals(&self) -> Intervals {
        let secs = |value: Option<u64>, default: Duration| {
            value.filter(|s| *s > 0).map(Duration::from_secs).unwrap_or(default)
        };
        Intervals {
            metrics: secs(self.metrics_interval_secs, METRICS_INTERVAL),
            inventory: secs(self.inventory_interval_secs, INVENTORY_INTERVAL),
            stats: secs(self.stats_interval_secs, STATS_INTERVAL),
            log_refresh: secs(self.log_refresh_interval_secs, LOG_REFRESH_INTERVAL),
            log_tail: secs(self.log_tail_interval_secs, LOG_TAIL_INTERVAL),
        }
    }

    pub fn log_tail_lines(&self) -> usize {
        self.log_tail_lines.filter(|n| *n > 0).unwrap_or(LOG_TAIL_LINES)
    }

    pub fn alert_threshold(&self) -> f64 {
        self.alert_threshold.unwrap_or(ALERT_THRESHOLD)
    }

    /// Resolve the backend base URL and timeout
    pub fn api_config(&self) -> Result<ApiConfig> {
        let base_url = resolve_base_url(self.api_url.as_deref(), self.origin.as_deref())?;
        let timeout = self
            .request_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(REQUEST_TIMEOUT);
        Ok(ApiConfig { base_url, timeout })
    }
}

/// Decide which backend to talk to.
///
/// An explicit URL wins. Otherwise a dashboard origin on one of the dev
/// ports (or on localhost) maps to the fixed local backend, and any other
/// origin is used as-is (same-origin deployment behind a reverse proxy).
pub fn resolve_base_url(explicit: Option<&str>, origin: Option<&str>) -> Result<Url> {
    if let Some(url) = explicit {
        return parse_base(url);
    }

    let Some(origin) = origin else {
        return parse_base(DEFAULT_BACKEND_URL);
    };

    let origin_url = parse_base(origin)?;
    let dev_port = origin_url
        .port()
        .map(|p| DEV_ORIGIN_PORTS.contains(&p))
        .unwrap_or(false);
    let local_host = origin_url.host_str() == Some("localhost");

    if dev_port || local_host {
        parse_base(DEFAULT_BACKEND_URL)
    } else {
        Ok(origin_url)
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid backend URL: {}", raw))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("Backend URL cannot be used as a base: {}", raw));
    }
    Ok(url)
}
