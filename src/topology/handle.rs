//! Connection handle returned by [`TopologyManager::acquire`].
//!
//! [`TopologyManager::acquire`]: super::TopologyManager::acquire

use std::sync::Arc;

use crate::command::{Arg, Command};
use crate::serializer::StoreValue;

use super::client::{StoreConnection, StoreResult, TransactionReply};

/// Which topology variant produced a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
    Single,
    Pool,
    Cluster,
}

impl TopologyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyKind::Single => "single",
            TopologyKind::Pool => "pool",
            TopologyKind::Cluster => "cluster",
        }
    }
}

/// A connection selected from the active topology
#[derive(Clone)]
pub struct TopologyHandle {
    kind: TopologyKind,
    slot: Option<usize>,
    conn: Arc<dyn StoreConnection>,
}

impl TopologyHandle {
    pub(crate) fn new(
        kind: TopologyKind,
        slot: Option<usize>,
        conn: Arc<dyn StoreConnection>,
    ) -> Self {
        Self { kind, slot, conn }
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Pool slot the connection came from, if pooled
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub async fn call(&self, name: &str, args: &[Arg]) -> StoreResult<StoreValue> {
        self.conn.call(name, args).await
    }

    /// Start a non-atomic batch
    pub fn open_pipeline(&self) -> PipelineBatch<'_> {
        PipelineBatch {
            conn: self.conn.as_ref(),
            commands: Vec::new(),
        }
    }

    /// Start an atomic batch
    pub fn open_transaction(&self) -> TransactionBatch<'_> {
        TransactionBatch {
            conn: self.conn.as_ref(),
            commands: Vec::new(),
        }
    }

    pub async fn close(&self) {
        self.conn.close().await
    }
}

impl std::fmt::Debug for TopologyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyHandle")
            .field("kind", &self.kind)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Queued non-atomic batch
pub struct PipelineBatch<'a> {
    conn: &'a dyn StoreConnection,
    commands: Vec<Command>,
}

impl PipelineBatch<'_> {
    pub fn queue(&mut self, name: &str, args: Vec<Arg>) -> &mut Self {
        self.commands.push(Command::new(name, args));
        self
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Send the queued commands; one outcome per command, in queue order
    pub async fn execute(self) -> StoreResult<Vec<StoreResult<StoreValue>>> {
        self.conn.exec_pipeline(&self.commands).await
    }
}

/// Queued atomic batch
pub struct TransactionBatch<'a> {
    conn: &'a dyn StoreConnection,
    commands: Vec<Command>,
}

impl TransactionBatch<'_> {
    pub fn queue(&mut self, name: &str, args: Vec<Arg>) -> &mut Self {
        self.commands.push(Command::new(name, args));
        self
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub async fn execute(self) -> StoreResult<TransactionReply> {
        self.conn.exec_transaction(&self.commands).await
    }
}
