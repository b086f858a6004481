//! Configuration for the strato dashboard.
//!
//! TOML file + `STRATO_`-prefixed environment overrides, merged through
//! figment, and translation to `strato_api::TransportConfig`. Tenant
//! provider credentials are data, not configuration -- they live in the
//! mirror store, never in this file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use strato_api::transport::TransportConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

/// Cloudflare endpoint settings shared by every tenant client.
#[derive(Debug, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// API base URL. Must end with a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout: default_timeout(),
        }
    }
}

fn default_api_base() -> String {
    strato_api::client::DEFAULT_API_BASE.to_owned()
}
fn default_timeout() -> u64 {
    30
}

impl ProviderSettings {
    /// Parse and validate the configured API base.
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        let url: Url = self.api_base.parse().map_err(|_| ConfigError::Validation {
            field: "provider.api_base".into(),
            reason: format!("invalid URL: {}", self.api_base),
        })?;
        if !url.path().ends_with('/') {
            return Err(ConfigError::Validation {
                field: "provider.api_base".into(),
                reason: "must end with a trailing slash".into(),
            });
        }
        Ok(url)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Display knobs for the dashboard landing page.
#[derive(Debug, Deserialize, Serialize)]
pub struct DashboardSettings {
    /// How many entries the recent-subdomains panel shows.
    #[serde(default = "default_recent_limit")]
    pub recent_subdomains: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            recent_subdomains: default_recent_limit(),
        }
    }
}

fn default_recent_limit() -> usize {
    5
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "strato", "strato").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("strato");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from an explicit file path + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STRATO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}
