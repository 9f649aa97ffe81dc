//! # Topology Module
//!
//! Connection lifecycle for the backing store: the store client capability
//! traits, retry policy, round-robin pool, cluster addressing and the
//! manager that ties them together.

pub mod client;
pub mod cluster;
pub mod errors;
pub mod handle;
pub mod manager;
pub mod pool;
pub mod retry;

pub use client::{
    BoxFuture, ConnectSpec, Endpoint, StoreConnection, StoreConnector, StoreError, StoreResult,
    TransactionReply,
};
pub use cluster::{parse_node, parse_nodes, NodeAddr, ReadScale, DEFAULT_PORT};
pub use errors::{TopologyError, TopologyResult};
pub use handle::{PipelineBatch, TopologyHandle, TopologyKind, TransactionBatch};
pub use manager::{TopologyManager, TopologyMode, TopologySettings, TopologyState};
pub use pool::ConnectionPool;
pub use retry::{connect_with_retry, RetryPolicy};
