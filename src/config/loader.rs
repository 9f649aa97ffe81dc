//! Application configuration and its loaders.
//!
//! The loader owns every read of files and environment variables; it hands
//! the core a finished [`CoreConfig`].

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;

use super::errors::{ConfigError, ConfigResult};
use super::types::CoreConfig;

pub const ENV_STORE_URL: &str = "RESTKV_STORE_URL";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "RESTKV_CONNECT_TIMEOUT_MS";
pub const ENV_COMMAND_TIMEOUT_MS: &str = "RESTKV_COMMAND_TIMEOUT_MS";
pub const ENV_POOL_ENABLED: &str = "RESTKV_POOL_ENABLED";
pub const ENV_POOL_MIN: &str = "RESTKV_POOL_MIN";
pub const ENV_POOL_MAX: &str = "RESTKV_POOL_MAX";
pub const ENV_CLUSTER_ENABLED: &str = "RESTKV_CLUSTER_ENABLED";
pub const ENV_CLUSTER_NODES: &str = "RESTKV_CLUSTER_NODES";
pub const ENV_CLUSTER_READ_SCALE: &str = "RESTKV_CLUSTER_READ_SCALE";
pub const ENV_FILTER_MODE: &str = "RESTKV_FILTER_MODE";
pub const ENV_BLOCKED_COMMANDS: &str = "RESTKV_BLOCKED_COMMANDS";
pub const ENV_ALLOWED_COMMANDS: &str = "RESTKV_ALLOWED_COMMANDS";
pub const ENV_HOST: &str = "RESTKV_HOST";
pub const ENV_PORT: &str = "RESTKV_PORT";
pub const ENV_TOKEN: &str = "RESTKV_TOKEN";
pub const ENV_LOG_LEVEL: &str = "RESTKV_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "RESTKV_LOG_JSON";

/// Logging options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Full process configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: CoreConfig,

    #[serde(default)]
    pub http: HttpServerConfig,

    /// Bearer token required on command routes; `None` disables the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&raw)?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from a key lookup, typically `std::env::var(key).ok()`.
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = &mut config.store;
        if let Some(url) = get(ENV_STORE_URL) {
            store.url = url;
        }
        if let Some(v) = get(ENV_CONNECT_TIMEOUT_MS) {
            store.connect_timeout_ms = parse_value(ENV_CONNECT_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(ENV_COMMAND_TIMEOUT_MS) {
            store.command_timeout_ms = parse_value(ENV_COMMAND_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(ENV_POOL_ENABLED) {
            store.pool.enabled = parse_flag(ENV_POOL_ENABLED, &v)?;
        }
        if let Some(v) = get(ENV_POOL_MIN) {
            store.pool.min_size = parse_value(ENV_POOL_MIN, &v)?;
        }
        if let Some(v) = get(ENV_POOL_MAX) {
            store.pool.max_size = parse_value(ENV_POOL_MAX, &v)?;
        }
        if let Some(v) = get(ENV_CLUSTER_ENABLED) {
            store.cluster.enabled = parse_flag(ENV_CLUSTER_ENABLED, &v)?;
        }
        if let Some(v) = get(ENV_CLUSTER_NODES) {
            store.cluster.nodes = split_list(&v);
        }
        if let Some(v) = get(ENV_CLUSTER_READ_SCALE) {
            store.cluster.read_scale = parse_value(ENV_CLUSTER_READ_SCALE, &v)?;
        }
        if let Some(v) = get(ENV_FILTER_MODE) {
            store.filter.mode = parse_value(ENV_FILTER_MODE, &v)?;
        }
        if let Some(v) = get(ENV_BLOCKED_COMMANDS) {
            store.filter.blocked = split_list(&v);
        }
        if let Some(v) = get(ENV_ALLOWED_COMMANDS) {
            store.filter.allowed = split_list(&v);
        }

        if let Some(host) = get(ENV_HOST) {
            config.http.host = host;
        }
        if let Some(v) = get(ENV_PORT) {
            config.http.port = parse_value(ENV_PORT, &v)?;
        }
        config.auth_token = get(ENV_TOKEN);
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log.level = level;
        }
        if let Some(v) = get(ENV_LOG_JSON) {
            config.log.json = parse_flag(ENV_LOG_JSON, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.store.validate()
    }
}

fn parse_value<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_value(key, e.to_string()))
}

fn parse_flag(key: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
