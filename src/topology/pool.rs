//! Round-robin connection pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::{ConnectSpec, StoreConnection, StoreConnector};
use super::errors::TopologyResult;
use super::retry::{connect_with_retry, RetryPolicy};

/// Fixed-size set of connections handed out in strict rotation.
///
/// Each slot sits behind its own async mutex so a slot that needs
/// reconnecting is reconnected by exactly one caller.
pub struct ConnectionPool {
    slots: Vec<Mutex<Arc<dyn StoreConnection>>>,
    cursor: AtomicUsize,
    connector: Arc<dyn StoreConnector>,
    spec: ConnectSpec,
    retry: RetryPolicy,
}

impl ConnectionPool {
    /// Open `max(size, 1)` connections concurrently
    pub async fn open(
        connector: Arc<dyn StoreConnector>,
        spec: ConnectSpec,
        retry: RetryPolicy,
        size: usize,
    ) -> TopologyResult<Self> {
        let size = size.max(1);
        let results = join_all(
            (0..size).map(|_| connect_with_retry(connector.as_ref(), &spec, &retry)),
        )
        .await;

        let mut connections = Vec::with_capacity(size);
        let mut failure = None;
        for result in results {
            match result {
                Ok(conn) => connections.push(conn),
                Err(e) => failure = failure.or(Some(e)),
            }
        }

        if let Some(err) = failure {
            // Do not leak the connections that did open
            for conn in &connections {
                conn.close().await;
            }
            return Err(err);
        }

        info!(size, "connection pool ready");
        Ok(Self {
            slots: connections.into_iter().map(Mutex::new).collect(),
            cursor: AtomicUsize::new(0),
            connector,
            spec,
            retry,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Advance the cursor and return the slot it pointed at
    pub fn next_index(&self) -> usize {
        let len = self.slots.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        previous % len
    }

    /// Pick the next connection, reconnecting it first if it is not ready
    pub async fn select(&self) -> TopologyResult<(usize, Arc<dyn StoreConnection>)> {
        let index = self.next_index();
        let mut slot = self.slots[index].lock().await;

        if !slot.is_ready() {
            debug!(slot = index, "pooled connection not ready, reconnecting");
            let fresh = connect_with_retry(self.connector.as_ref(), &self.spec, &self.retry).await?;
            *slot = fresh;
        }

        Ok((index, Arc::clone(&*slot)))
    }

    /// Close every pooled connection
    pub async fn close_all(&self) {
        for slot in &self.slots {
            slot.lock().await.close().await;
        }
    }
}
