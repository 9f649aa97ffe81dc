//! # Execution Errors
//!
//! Every failure a request can end in, classified for the HTTP boundary.

use thiserror::Error;

use crate::command::ParseError;
use crate::serializer::Envelope;
use crate::topology::{StoreError, TopologyError};

/// Result type for the execution coordinator
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Execution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Malformed request
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Denied by the filter policy
    #[error("{reason}")]
    CommandBlocked { command: String, reason: String },

    /// Store unavailable for this request; the next request reconnects
    #[error("Connection error: {0}")]
    Connection(String),

    /// Cluster misconfiguration
    #[error("Cluster configuration error: {0}")]
    ClusterConfig(String),

    /// The store refused to run an atomic batch
    #[error("Transaction aborted")]
    TransactionAborted,

    /// A command failed in the store; message passed through verbatim
    #[error("{0}")]
    Backend(String),
}

impl ExecutionError {
    pub fn blocked(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandBlocked {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Aggregate failure for an atomic batch, naming only the first error
    pub fn transaction_failed(first: &StoreError) -> Self {
        Self::Backend(format!("Transaction failed: {}", first.message))
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Parse(_) => 400,
            Self::CommandBlocked { .. } => 403,
            Self::Backend(_) => 400,
            Self::TransactionAborted => 409,
            Self::Connection(_) => 503,
            Self::ClusterConfig(_) => 500,
        }
    }

    /// Only connection failures may succeed on a later request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::from_error(self)
    }
}

impl From<TopologyError> for ExecutionError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::Connection(msg) => Self::Connection(msg),
            TopologyError::ClusterConfig(msg) => Self::ClusterConfig(msg),
        }
    }
}

impl From<StoreError> for ExecutionError {
    fn from(err: StoreError) -> Self {
        Self::Backend(err.message)
    }
}
