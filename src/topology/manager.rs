//! # Topology Manager
//!
//! Owns the single process-wide topology: one connection, a round-robin
//! pool, or a cluster view. The topology is created on first use and cached.
//!
//! ```text
//! Uninitialized --acquire--> Connecting --ok--> Ready
//!       ^                        |                |
//!       +--------- failure ------+                |
//!       +--------- connection lost / reset -------+
//! any --shutdown--> Closed
//! ```
//!
//! Concurrent callers that arrive while a connect is in flight await the same
//! attempt. A failed attempt is dropped from the slot before its result is
//! returned, so the next caller always starts fresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::config::CoreConfig;

use super::client::{BoxFuture, ConnectSpec, Endpoint, StoreConnection, StoreConnector};
use super::cluster::{parse_nodes, NodeAddr, ReadScale};
use super::errors::{TopologyError, TopologyResult};
use super::handle::{TopologyHandle, TopologyKind};
use super::pool::ConnectionPool;
use super::retry::{connect_with_retry, RetryPolicy};

/// Which topology to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyMode {
    Single,
    Pool { size: usize },
    Cluster { nodes: Vec<String>, read_scale: ReadScale },
}

/// Settings the manager builds topologies from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySettings {
    pub mode: TopologyMode,
    pub url: String,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub retry: RetryPolicy,
}

impl TopologySettings {
    /// Cluster mode wins over pooling when both are enabled.
    pub fn from_config(config: &CoreConfig) -> Self {
        let mode = if config.cluster.enabled {
            TopologyMode::Cluster {
                nodes: config.cluster.nodes.clone(),
                read_scale: config.cluster.read_scale,
            }
        } else if config.pool.enabled {
            TopologyMode::Pool {
                size: config.pool.min_size.max(1),
            }
        } else {
            TopologyMode::Single
        };

        Self {
            mode,
            url: config.url.clone(),
            connect_timeout: config.connect_timeout(),
            command_timeout: config.command_timeout(),
            retry: RetryPolicy::default(),
        }
    }

    fn spec(&self, endpoint: Endpoint) -> ConnectSpec {
        ConnectSpec {
            endpoint,
            connect_timeout: self.connect_timeout,
            command_timeout: self.command_timeout,
        }
    }

    fn standalone_spec(&self) -> ConnectSpec {
        self.spec(Endpoint::Standalone {
            url: self.url.clone(),
        })
    }
}

/// Observable manager state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyState {
    Uninitialized,
    Connecting,
    Ready,
    Closed,
}

enum Topology {
    Single(Arc<dyn StoreConnection>),
    Pool(ConnectionPool),
    Cluster {
        conn: Arc<dyn StoreConnection>,
        nodes: Vec<NodeAddr>,
        read_scale: ReadScale,
    },
}

impl Topology {
    fn kind(&self) -> TopologyKind {
        match self {
            Topology::Single(_) => TopologyKind::Single,
            Topology::Pool(_) => TopologyKind::Pool,
            Topology::Cluster { .. } => TopologyKind::Cluster,
        }
    }

    fn summary(&self) -> String {
        match self {
            Topology::Single(_) => "single".to_string(),
            Topology::Pool(pool) => format!("pool of {}", pool.len()),
            Topology::Cluster {
                nodes, read_scale, ..
            } => {
                let nodes: Vec<String> = nodes.iter().map(NodeAddr::to_string).collect();
                format!("cluster [{}] read_scale={}", nodes.join(", "), read_scale.as_str())
            }
        }
    }

    /// Pooled slots heal themselves on selection, so a pool is always healthy
    fn is_healthy(&self) -> bool {
        match self {
            Topology::Single(conn) | Topology::Cluster { conn, .. } => conn.is_ready(),
            Topology::Pool(_) => true,
        }
    }

    async fn handle(&self) -> TopologyResult<TopologyHandle> {
        match self {
            Topology::Single(conn) => Ok(TopologyHandle::new(
                TopologyKind::Single,
                None,
                Arc::clone(conn),
            )),
            Topology::Cluster { conn, .. } => Ok(TopologyHandle::new(
                TopologyKind::Cluster,
                None,
                Arc::clone(conn),
            )),
            Topology::Pool(pool) => {
                let (index, conn) = pool.select().await?;
                Ok(TopologyHandle::new(TopologyKind::Pool, Some(index), conn))
            }
        }
    }

    async fn close(&self) {
        match self {
            Topology::Single(conn) | Topology::Cluster { conn, .. } => conn.close().await,
            Topology::Pool(pool) => pool.close_all().await,
        }
    }
}

type Attempt = Shared<BoxFuture<'static, TopologyResult<Arc<Topology>>>>;

enum Slot {
    Uninitialized,
    Connecting { generation: u64, attempt: Attempt },
    Ready { generation: u64, topology: Arc<Topology> },
    Closed,
}

/// Lazily connects and caches the process topology
pub struct TopologyManager {
    connector: Arc<dyn StoreConnector>,
    settings: Arc<TopologySettings>,
    slot: Mutex<Slot>,
    generation: AtomicU64,
    /// Generation of the last attempt that finished after shutdown
    orphan: AtomicU64,
}

impl TopologyManager {
    pub fn new(connector: Arc<dyn StoreConnector>, settings: TopologySettings) -> Self {
        Self {
            connector,
            settings: Arc::new(settings),
            slot: Mutex::new(Slot::Uninitialized),
            generation: AtomicU64::new(0),
            orphan: AtomicU64::new(0),
        }
    }

    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &CoreConfig) -> Self {
        Self::new(connector, TopologySettings::from_config(config))
    }

    pub fn settings(&self) -> &TopologySettings {
        &self.settings
    }

    pub fn state(&self) -> TopologyState {
        match &*self.lock() {
            Slot::Uninitialized => TopologyState::Uninitialized,
            Slot::Connecting { .. } => TopologyState::Connecting,
            Slot::Ready { .. } => TopologyState::Ready,
            Slot::Closed => TopologyState::Closed,
        }
    }

    /// Get a connection handle, connecting first if needed.
    ///
    /// A single or cluster connection that has gone away is reset and
    /// replaced within the same call.
    pub async fn acquire(&self) -> TopologyResult<TopologyHandle> {
        let topology = self.topology().await?;
        if topology.is_healthy() {
            return topology.handle().await;
        }

        warn!(kind = topology.kind().as_str(), "store connection lost, resetting topology");
        if self.reset_if_current(&topology) {
            topology.close().await;
        }

        let topology = self.topology().await?;
        topology.handle().await
    }

    /// Drop a ready topology so the next acquire reconnects
    pub async fn reset(&self) {
        let previous = {
            let mut slot = self.lock();
            match std::mem::replace(&mut *slot, Slot::Uninitialized) {
                Slot::Ready { topology, .. } => Some(topology),
                other => {
                    *slot = other;
                    None
                }
            }
        };

        if let Some(topology) = previous {
            info!(kind = topology.kind().as_str(), "topology reset");
            topology.close().await;
        }
    }

    /// Close every held connection. Later acquires fail.
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.lock(), Slot::Closed);
        match previous {
            Slot::Ready { topology, .. } => {
                topology.close().await;
                info!(kind = topology.kind().as_str(), "topology shut down");
            }
            // The in-flight attempt closes what it opens once it sees Closed
            Slot::Connecting { .. } => info!("topology shut down during connect"),
            Slot::Uninitialized | Slot::Closed => debug!("topology shut down with nothing open"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn topology(&self) -> TopologyResult<Arc<Topology>> {
        let (generation, attempt) = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready { topology, .. } => return Ok(Arc::clone(topology)),
                Slot::Closed => return Err(shut_down()),
                Slot::Connecting {
                    generation,
                    attempt,
                } => (*generation, attempt.clone()),
                Slot::Uninitialized => {
                    let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                    let connector = Arc::clone(&self.connector);
                    let settings = Arc::clone(&self.settings);
                    let attempt = async move { create(connector, settings).await.map(Arc::new) }
                        .boxed()
                        .shared();
                    debug!(generation, "starting topology connect");
                    *slot = Slot::Connecting {
                        generation,
                        attempt: attempt.clone(),
                    };
                    (generation, attempt)
                }
            }
        };

        let result = attempt.await;
        self.settle(generation, result).await
    }

    /// Record the outcome of attempt `generation`. Only the attempt that still
    /// owns the slot may move it; later waiters find it already settled.
    async fn settle(
        &self,
        generation: u64,
        result: TopologyResult<Arc<Topology>>,
    ) -> TopologyResult<Arc<Topology>> {
        let orphaned = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Connecting { generation: current, .. } if *current == generation => {
                    *slot = match &result {
                        Ok(topology) => {
                            info!(topology = %topology.summary(), "topology ready");
                            Slot::Ready {
                                generation,
                                topology: Arc::clone(topology),
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "topology connect failed");
                            Slot::Uninitialized
                        }
                    };
                    None
                }
                // Every waiter on the attempt lands here; only the first closes
                Slot::Closed if self.orphan.swap(generation, Ordering::AcqRel) != generation => {
                    result.as_ref().ok().map(Arc::clone)
                }
                Slot::Closed => return Err(shut_down()),
                _ => None,
            }
        };

        if let Some(topology) = orphaned {
            topology.close().await;
            return Err(shut_down());
        }
        result
    }

    fn reset_if_current(&self, stale: &Arc<Topology>) -> bool {
        let mut slot = self.lock();
        match &*slot {
            Slot::Ready { topology, generation } if Arc::ptr_eq(topology, stale) => {
                debug!(generation = *generation, "dropping stale topology");
                *slot = Slot::Uninitialized;
                true
            }
            _ => false,
        }
    }
}

fn shut_down() -> TopologyError {
    TopologyError::connection("Topology manager is shut down")
}

async fn create(
    connector: Arc<dyn StoreConnector>,
    settings: Arc<TopologySettings>,
) -> TopologyResult<Topology> {
    match &settings.mode {
        TopologyMode::Single => {
            let spec = settings.standalone_spec();
            let conn = connect_with_retry(connector.as_ref(), &spec, &settings.retry).await?;
            Ok(Topology::Single(conn))
        }
        TopologyMode::Pool { size } => {
            let spec = settings.standalone_spec();
            let pool = ConnectionPool::open(connector, spec, settings.retry, *size).await?;
            Ok(Topology::Pool(pool))
        }
        TopologyMode::Cluster { nodes, read_scale } => {
            // Fatal before any connect is attempted
            let nodes = parse_nodes(nodes)?;
            let spec = settings.spec(Endpoint::Cluster {
                nodes: nodes.clone(),
                read_scale: *read_scale,
            });
            let conn = connect_with_retry(connector.as_ref(), &spec, &settings.retry).await?;
            Ok(Topology::Cluster {
                conn,
                nodes,
                read_scale: *read_scale,
            })
        }
    }
}
