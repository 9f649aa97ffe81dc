//! Store client capability
//!
//! The contract a backing store implementation provides. The adapter never
//! speaks the store's wire protocol itself; it only drives these traits.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::command::{Arg, Command};
use crate::serializer::StoreValue;

use super::cluster::{NodeAddr, ReadScale};

/// Boxed future returned by the capability traits
pub use futures_util::future::BoxFuture;

/// An error reported by the store for a command or a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Where a connection points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Standalone {
        url: String,
    },
    /// Read scaling is passed through to the store client untouched
    Cluster {
        nodes: Vec<NodeAddr>,
        read_scale: ReadScale,
    },
}

/// Everything a connector needs to open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSpec {
    pub endpoint: Endpoint,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

/// Outcome of an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionReply {
    /// The store refused to run the batch (e.g. a watched key changed)
    Aborted,
    /// Per-command outcomes, in queue order
    Completed(Vec<StoreResult<StoreValue>>),
}

/// An open connection to the store
pub trait StoreConnection: Send + Sync {
    /// Run one command
    fn call<'a>(
        &'a self,
        name: &'a str,
        args: &'a [Arg],
    ) -> BoxFuture<'a, StoreResult<StoreValue>>;

    /// Run a non-atomic batch; one outcome per command, in order
    fn exec_pipeline<'a>(
        &'a self,
        commands: &'a [Command],
    ) -> BoxFuture<'a, StoreResult<Vec<StoreResult<StoreValue>>>>;

    /// Run an atomic batch
    fn exec_transaction<'a>(
        &'a self,
        commands: &'a [Command],
    ) -> BoxFuture<'a, StoreResult<TransactionReply>>;

    /// Whether the connection can accept commands
    fn is_ready(&self) -> bool;

    /// Close the connection
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Opens connections to the store
pub trait StoreConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        spec: &'a ConnectSpec,
    ) -> BoxFuture<'a, StoreResult<Arc<dyn StoreConnection>>>;
}
