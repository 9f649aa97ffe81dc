//! # Topology Errors

use thiserror::Error;

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors raised while acquiring a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Store unavailable; a later request starts a fresh attempt
    #[error("Connection error: {0}")]
    Connection(String),

    /// Cluster misconfiguration; needs operator action
    #[error("Cluster configuration error: {0}")]
    ClusterConfig(String),
}

impl TopologyError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn cluster_config(msg: impl Into<String>) -> Self {
        Self::ClusterConfig(msg.into())
    }

    /// Whether a later request may succeed without operator action
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
