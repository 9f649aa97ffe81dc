//! Store client capability backed by [`MemoryStore`].
//!
//! Every connection opened by one connector shares the same keyspace. The
//! connector also carries the fault hooks tests use to exercise retry,
//! reconnect and abort paths.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::debug;

use crate::command::{Arg, Command};
use crate::serializer::StoreValue;
use crate::topology::{
    BoxFuture, ConnectSpec, Endpoint, StoreConnection, StoreConnector, StoreError, StoreResult,
    TransactionReply,
};

use super::store::MemoryStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Faults {
    failing_connects: AtomicUsize,
    connect_attempts: AtomicUsize,
    connect_delay_ms: AtomicU64,
    abort_next_transaction: AtomicBool,
    closes: AtomicUsize,
}

/// Opens connections onto a shared in-memory keyspace
#[derive(Debug, Default)]
pub struct MemoryConnector {
    store: Arc<Mutex<MemoryStore>>,
    faults: Arc<Faults>,
    connections: Mutex<Vec<Weak<MemoryConnection>>>,
    last_endpoint: Mutex<Option<Endpoint>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connect attempts fail
    pub fn fail_next_connects(&self, n: usize) {
        self.faults.failing_connects.store(n, Ordering::SeqCst);
    }

    /// Delay every connect attempt by `delay`
    pub fn set_connect_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.faults.connect_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Make the next transaction report an abort
    pub fn abort_next_transaction(&self) {
        self.faults.abort_next_transaction.store(true, Ordering::SeqCst);
    }

    /// Total connect attempts, failed ones included
    pub fn connect_attempts(&self) -> usize {
        self.faults.connect_attempts.load(Ordering::SeqCst)
    }

    /// Number of `close` calls across all connections
    pub fn close_calls(&self) -> usize {
        self.faults.closes.load(Ordering::SeqCst)
    }

    /// Mark every open connection as no longer ready
    pub fn disconnect_all(&self) {
        for conn in lock(&self.connections).iter().filter_map(Weak::upgrade) {
            conn.ready.store(false, Ordering::SeqCst);
        }
    }

    /// Connections opened and not yet closed
    pub fn open_connections(&self) -> usize {
        lock(&self.connections)
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|conn| conn.is_ready())
            .count()
    }

    /// Endpoint of the most recent successful connect
    pub fn last_endpoint(&self) -> Option<Endpoint> {
        lock(&self.last_endpoint).clone()
    }

    /// Run a command directly against the keyspace
    pub fn execute(&self, name: &str, args: &[Arg]) -> StoreResult<StoreValue> {
        lock(&self.store).execute(name, args)
    }

    fn take_failure(&self) -> bool {
        self.faults
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl StoreConnector for MemoryConnector {
    fn connect<'a>(
        &'a self,
        spec: &'a ConnectSpec,
    ) -> BoxFuture<'a, StoreResult<Arc<dyn StoreConnection>>> {
        Box::pin(async move {
            let attempt = self.faults.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1;

            let delay = self.faults.connect_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            if self.take_failure() {
                debug!(attempt, "memory connect refused");
                return Err(StoreError::new("connection refused"));
            }

            *lock(&self.last_endpoint) = Some(spec.endpoint.clone());
            let conn = Arc::new(MemoryConnection {
                store: Arc::clone(&self.store),
                faults: Arc::clone(&self.faults),
                ready: AtomicBool::new(true),
            });

            let mut connections = lock(&self.connections);
            connections.retain(|weak| weak.strong_count() > 0);
            connections.push(Arc::downgrade(&conn));
            drop(connections);

            debug!(attempt, "memory connection opened");
            Ok(conn as Arc<dyn StoreConnection>)
        })
    }
}

/// A connection onto the shared keyspace
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<Mutex<MemoryStore>>,
    faults: Arc<Faults>,
    ready: AtomicBool,
}

impl MemoryConnection {
    fn check_ready(&self) -> StoreResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::new("connection is closed"))
        }
    }
}

impl StoreConnection for MemoryConnection {
    fn call<'a>(
        &'a self,
        name: &'a str,
        args: &'a [Arg],
    ) -> BoxFuture<'a, StoreResult<StoreValue>> {
        Box::pin(async move {
            self.check_ready()?;
            lock(&self.store).execute(name, args)
        })
    }

    fn exec_pipeline<'a>(
        &'a self,
        commands: &'a [Command],
    ) -> BoxFuture<'a, StoreResult<Vec<StoreResult<StoreValue>>>> {
        Box::pin(async move {
            self.check_ready()?;
            // Each command takes the lock on its own; other callers may interleave
            let results = commands
                .iter()
                .map(|cmd| lock(&self.store).execute(&cmd.name, &cmd.args))
                .collect();
            Ok(results)
        })
    }

    fn exec_transaction<'a>(
        &'a self,
        commands: &'a [Command],
    ) -> BoxFuture<'a, StoreResult<TransactionReply>> {
        Box::pin(async move {
            self.check_ready()?;
            if self.faults.abort_next_transaction.swap(false, Ordering::SeqCst) {
                return Ok(TransactionReply::Aborted);
            }

            let mut store = lock(&self.store);
            let results = commands
                .iter()
                .map(|cmd| store.execute(&cmd.name, &cmd.args))
                .collect();
            Ok(TransactionReply::Completed(results))
        })
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.faults.closes.fetch_add(1, Ordering::SeqCst);
            self.ready.store(false, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ConnectSpec {
        ConnectSpec {
            endpoint: Endpoint::Standalone {
                url: "memory://".to_string(),
            },
            connect_timeout: Duration::from_secs(1),
            command_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_connections_share_keyspace() {
        let connector = MemoryConnector::new();
        let a = connector.connect(&spec()).await.unwrap();
        let b = connector.connect(&spec()).await.unwrap();

        a.call("SET", &[Arg::from("k"), Arg::from("v")]).await.unwrap();
        let value = b.call("GET", &[Arg::from("k")]).await.unwrap();
        assert_eq!(value, StoreValue::Bytes(b"v".to_vec()));
        assert_eq!(connector.open_connections(), 2);
    }

    #[tokio::test]
    async fn test_fault_hooks() {
        let connector = MemoryConnector::new();
        connector.fail_next_connects(1);
        assert!(connector.connect(&spec()).await.is_err());
        let conn = connector.connect(&spec()).await.unwrap();
        assert_eq!(connector.connect_attempts(), 2);

        connector.abort_next_transaction();
        let commands = vec![Command::new("SET", vec!["k".into(), "v".into()])];
        assert_eq!(
            conn.exec_transaction(&commands).await.unwrap(),
            TransactionReply::Aborted
        );
        // The abort only fires once
        assert!(matches!(
            conn.exec_transaction(&commands).await.unwrap(),
            TransactionReply::Completed(_)
        ));

        connector.disconnect_all();
        assert!(!conn.is_ready());
        assert!(conn.call("PING", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_pipeline_reports_each_outcome() {
        let connector = MemoryConnector::new();
        let conn = connector.connect(&spec()).await.unwrap();
        let commands = vec![
            Command::new("SET", vec!["k".into(), "v".into()]),
            Command::new("INCR", vec!["k".into()]),
            Command::new("GET", vec!["k".into()]),
        ];

        let results = conn.exec_pipeline(&commands).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(StoreValue::Ok));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(StoreValue::Bytes(b"v".to_vec())));
    }
}
