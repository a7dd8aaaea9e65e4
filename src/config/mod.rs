//! Configuration file handling
//!
//! The config lives at `~/.swarmctl/config.yaml` unless `--config` points
//! elsewhere. A missing file is not an error: every field has a default.
//! Environment variables are applied on top of the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::docker::DEFAULT_API_VERSION;
use crate::reconcile::ReconcilerConfig;

/// Default port for the HTTP API
pub const DEFAULT_SERVER_PORT: u16 = 8282;

/// Engine endpoint used when nothing else is configured
pub const DEFAULT_PLATFORM_URL: &str = "http://127.0.0.1:2375";

/// Overrides `platform.url`
pub const ENV_PLATFORM_URL: &str = "SWARMCTL_PLATFORM_URL";

/// Used for `platform.url` when it is a TCP address and no explicit override is set
pub const ENV_DOCKER_HOST: &str = "DOCKER_HOST";

/// Default config file location: ~/.swarmctl/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".swarmctl")
        .join("config.yaml")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to write config: {0}")]
    WriteError(String),
}

/// The complete configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// How to reach the orchestration platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Engine endpoint (`http://`, `https://` or `tcp://`)
    #[serde(default = "default_platform_url")]
    pub url: String,

    /// Engine API version prefix, e.g. "v1.43"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request deadline; 0 disables it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PlatformConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: default_platform_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_platform_url() -> String {
    DEFAULT_PLATFORM_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// HTTP API server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_addr: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_address(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse config from YAML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Serialize config to YAML string
pub fn serialize_config(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(|e| ConfigError::WriteError(e.to_string()))
}

impl Config {
    /// Apply environment overrides using `lookup` to read variables
    ///
    /// `SWARMCTL_PLATFORM_URL` wins over `DOCKER_HOST`; a `DOCKER_HOST` that is
    /// not a TCP address is ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_PLATFORM_URL).filter(|v| !v.trim().is_empty()) {
            self.platform.url = url;
        } else if let Some(host) = lookup(ENV_DOCKER_HOST).filter(|v| v.starts_with("tcp://")) {
            self.platform.url = host;
        }
    }
}

// ============================================================================
// I/O boundary functions
// ============================================================================

/// Load config from a specific path, then apply the process environment
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let mut config = if path.exists() {
        parse_config(&std::fs::read_to_string(path)?)?
    } else {
        Config::default()
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Save config to a specific path
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serialize_config(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
