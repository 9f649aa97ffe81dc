//! Store-side configuration consumed by the adapter core.
//!
//! Supplied as a structured value by a loader; nothing in the core reads
//! the process environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::{FilterMode, FilterPolicy};
use crate::topology::ReadScale;

use super::errors::{ConfigError, ConfigResult};

/// Connection pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Connections opened up front (at least one is always opened)
    #[serde(default = "default_pool_min")]
    pub min_size: usize,

    #[serde(default = "default_pool_max")]
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_size: default_pool_min(),
            max_size: default_pool_max(),
        }
    }
}

/// Cluster settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Node addresses, as URLs or `host:port`
    #[serde(default)]
    pub nodes: Vec<String>,

    #[serde(default)]
    pub read_scale: ReadScale,
}

/// Command filter settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub mode: FilterMode,

    /// Extra commands to deny in blocklist mode
    #[serde(default)]
    pub blocked: Vec<String>,

    /// Extra commands to permit in allowlist mode
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// Configuration for the execution core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Store URL for single and pooled topologies
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Forwarded to the store client; not enforced by the core
    #[serde(default = "default_timeout_ms")]
    pub command_timeout_ms: u64,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub cluster: ClusterSettings,

    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_pool_min() -> usize {
    1
}

fn default_pool_max() -> usize {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_ms: default_timeout_ms(),
            command_timeout_ms: default_timeout_ms(),
            pool: PoolConfig::default(),
            cluster: ClusterSettings::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Check settings that can be rejected before any connection is made.
    ///
    /// An empty cluster node list is not checked here; it fails the first
    /// acquire as a cluster configuration error.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "connect_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.pool.enabled {
            if self.pool.max_size == 0 {
                return Err(ConfigError::invalid_value("pool.max_size", "must be at least 1"));
            }
            if self.pool.min_size > self.pool.max_size {
                return Err(ConfigError::invalid(format!(
                    "pool.min_size ({}) exceeds pool.max_size ({})",
                    self.pool.min_size, self.pool.max_size
                )));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Build the filter policy described by this config
    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy::new(self.filter.mode, &self.filter.blocked, &self.filter.allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: CoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.filter.mode, FilterMode::Blocklist);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_sections() {
        let config: CoreConfig = serde_json::from_str(
            r#"{
                "pool": {"enabled": true, "min_size": 3},
                "cluster": {"nodes": ["a:1"], "read_scale": "slave"},
                "filter": {"mode": "allowlist", "allowed": ["custom"]}
            }"#,
        )
        .unwrap();
        assert_eq!(config.pool.min_size, 3);
        assert_eq!(config.pool.max_size, 10);
        assert_eq!(config.cluster.read_scale, ReadScale::Slave);
        assert!(config.filter_policy().decide("custom").is_allowed());
    }

    #[test]
    fn test_validate_pool_bounds() {
        let mut config = CoreConfig::default();
        config.pool = PoolConfig {
            enabled: true,
            min_size: 5,
            max_size: 2,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.pool.max_size = 0;
        config.pool.min_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_connect_timeout() {
        let config = CoreConfig {
            connect_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
