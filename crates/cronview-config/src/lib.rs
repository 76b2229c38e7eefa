use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var that overrides `gateway.auth_token`.
pub const GATEWAY_TOKEN_ENV: &str = "CRONVIEW_GATEWAY_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Chat command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Whether text commands such as `/cron` are processed at all.
    #[serde(default = "default_true")]
    pub text: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { text: true }
    }
}

/// Where cron jobs are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronSourceKind {
    /// Local JSON5 store file.
    #[default]
    Store,
    /// Remote registry behind the gateway (`cron.list`).
    Gateway,
}

/// Cron job source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronConfig {
    #[serde(default)]
    pub source: CronSourceKind,
    /// Store file path; `~` is expanded. Defaults to `~/.cronview/cron/jobs.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// Gateway client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// WebSocket URL of the gateway.
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Bearer token for authentication (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Upper bound for one gateway round-trip.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_gateway_url() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Top-level cronview configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronViewConfig {
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl CronViewConfig {
    /// Apply environment overrides (currently only the gateway token).
    pub fn apply_env(&mut self) {
        match std::env::var(GATEWAY_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => self.gateway.auth_token = Some(token),
            _ => {}
        }
    }
}

/// Resolve the cronview config directory (~/.cronview/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".cronview"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.cronview/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<CronViewConfig, ConfigError> {
    let path = config_file_path()?;
    load_config_at(&path)
}

/// Load `.env`, the config file at `path`, and env overrides.
pub fn load_config_at(path: &Path) -> Result<CronViewConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let mut config = load_config_from(path)?;
    config.apply_env();
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<CronViewConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(CronViewConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: CronViewConfig = json5::from_str(&content)?;
    Ok(config)
}
