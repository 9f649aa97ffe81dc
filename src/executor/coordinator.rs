//! Execution coordinator
//!
//! Validates commands against the filter policy, dispatches them through
//! the topology manager in one of three modes, and serializes the
//! outcome into response envelopes.
//!
//! Every command in a batch is checked before anything is sent, so a
//! single denial rejects the whole batch.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::command::{Command, ExecutionRequest};
use crate::config::CoreConfig;
use crate::filter::{FilterDecision, FilterPolicy};
use crate::serializer::{Envelope, StoreValue};
use crate::topology::{StoreConnector, StoreResult, TopologyManager, TransactionReply};

use super::errors::{ExecutionError, ExecutionResult};

/// Status and JSON body produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn from_error(err: &ExecutionError) -> Self {
        Self {
            status: err.status_code(),
            body: err.to_envelope().to_json(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Runs requests against the store
pub struct ExecutionCoordinator {
    policy: FilterPolicy,
    topology: Arc<TopologyManager>,
}

impl ExecutionCoordinator {
    pub fn new(policy: FilterPolicy, topology: Arc<TopologyManager>) -> Self {
        Self { policy, topology }
    }

    /// Build the policy and topology manager described by `config`
    pub fn from_config(connector: Arc<dyn StoreConnector>, config: &CoreConfig) -> Self {
        let topology = TopologyManager::from_config(connector, config);
        Self::new(config.filter_policy(), Arc::new(topology))
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    pub fn topology(&self) -> &Arc<TopologyManager> {
        &self.topology
    }

    /// Check one command against the filter policy
    pub fn validate(&self, command: &Command) -> ExecutionResult<()> {
        match self.policy.decide(&command.name) {
            FilterDecision::Allow => Ok(()),
            FilterDecision::Deny(reason) => {
                warn!(
                    command = %command.name,
                    mode = self.policy.mode().as_str(),
                    "command blocked"
                );
                Err(ExecutionError::blocked(&command.name, reason))
            }
        }
    }

    fn validate_all(&self, commands: &[Command]) -> ExecutionResult<()> {
        commands.iter().try_for_each(|command| self.validate(command))
    }

    /// Run one command
    pub async fn execute(&self, command: &Command) -> ExecutionResult<Envelope> {
        self.validate(command)?;
        let handle = self.topology.acquire().await?;
        debug!(command = %command.name, topology = handle.kind().as_str(), "dispatching command");

        let value = handle.call(&command.name, &command.args).await?;
        Ok(Envelope::success(&value))
    }

    /// Run a non-atomic batch. Always one envelope per command, in order;
    /// a failing command does not affect its siblings.
    pub async fn pipeline(&self, commands: &[Command]) -> ExecutionResult<Vec<Envelope>> {
        self.validate_all(commands)?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let handle = self.topology.acquire().await?;
        let mut batch = handle.open_pipeline();
        for command in commands {
            batch.push(command.clone());
        }
        debug!(commands = commands.len(), "dispatching pipeline");

        let results = batch
            .execute()
            .await
            .map_err(|e| ExecutionError::Connection(e.message))?;
        check_len("pipeline", &results, commands.len())?;

        Ok(results
            .iter()
            .map(|result| match result {
                Ok(value) => Envelope::success(value),
                Err(e) => Envelope::failure(e.message.as_str()),
            })
            .collect())
    }

    /// Run an atomic batch. Either one success envelope per command or a
    /// single error; the first failing command's message wins.
    pub async fn transaction(&self, commands: &[Command]) -> ExecutionResult<Vec<Envelope>> {
        self.validate_all(commands)?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let handle = self.topology.acquire().await?;
        let mut batch = handle.open_transaction();
        for command in commands {
            batch.push(command.clone());
        }
        debug!(commands = commands.len(), "dispatching transaction");

        let reply = batch
            .execute()
            .await
            .map_err(|e| ExecutionError::Connection(e.message))?;

        let results = match reply {
            TransactionReply::Aborted => {
                warn!(commands = commands.len(), "transaction aborted by store");
                return Err(ExecutionError::TransactionAborted);
            }
            TransactionReply::Completed(results) => results,
        };
        check_len("transaction", &results, commands.len())?;

        if let Some(first) = results.iter().find_map(|r| r.as_ref().err()) {
            return Err(ExecutionError::transaction_failed(first));
        }

        Ok(results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(Envelope::success)
            .collect())
    }

    /// Run any request and map the outcome to a status and body
    pub async fn run(&self, request: &ExecutionRequest) -> Response {
        let outcome = match request {
            ExecutionRequest::Single(command) => self.execute(command).await.map(|e| e.to_json()),
            ExecutionRequest::Batch { commands, atomic } => {
                let envelopes = if *atomic {
                    self.transaction(commands).await
                } else {
                    self.pipeline(commands).await
                };
                envelopes.map(|all| Value::Array(all.iter().map(Envelope::to_json).collect()))
            }
        };

        match outcome {
            Ok(body) => Response::ok(body),
            Err(err) => {
                debug!(status = err.status_code(), error = %err, "request failed");
                Response::from_error(&err)
            }
        }
    }

    /// Close every held connection
    pub async fn shutdown(&self) {
        self.topology.shutdown().await;
    }
}

fn check_len(
    mode: &str,
    results: &[StoreResult<StoreValue>],
    expected: usize,
) -> ExecutionResult<()> {
    if results.len() == expected {
        return Ok(());
    }
    Err(ExecutionError::backend(format!(
        "{} returned {} results for {} commands",
        mode,
        results.len(),
        expected
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Arg;
    use crate::memory::MemoryConnector;
    use serde_json::json;

    fn coordinator(policy: FilterPolicy) -> (Arc<MemoryConnector>, ExecutionCoordinator) {
        let connector = Arc::new(MemoryConnector::new());
        let dyn_connector: Arc<dyn StoreConnector> = connector.clone();
        let coordinator = ExecutionCoordinator::from_config(dyn_connector, &CoreConfig::default());
        (connector, ExecutionCoordinator::new(policy, Arc::clone(coordinator.topology())))
    }

    fn cmd(parts: &[&str]) -> Command {
        Command::new(parts[0], parts[1..].iter().map(|s| Arg::from(*s)).collect())
    }

    #[tokio::test]
    async fn test_execute_round_trip() {
        let (_, coordinator) = coordinator(FilterPolicy::blocklist());
        let set = coordinator.execute(&cmd(&["SET", "k", "v"])).await.unwrap();
        assert_eq!(set.to_json(), json!({"result": "OK"}));

        let get = coordinator.execute(&cmd(&["GET", "k"])).await.unwrap();
        assert_eq!(get.to_json(), json!({"result": "v"}));
    }

    #[tokio::test]
    async fn test_blocked_command_never_connects() {
        let (connector, coordinator) = coordinator(FilterPolicy::blocklist());
        let err = coordinator.execute(&cmd(&["flushall"])).await.unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::CommandBlocked { ref command, .. } if command == "FLUSHALL"
        ));
        assert_eq!(connector.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_one_denial_rejects_whole_pipeline() {
        let (connector, coordinator) = coordinator(FilterPolicy::blocklist());
        let commands = vec![cmd(&["SET", "a", "1"]), cmd(&["CONFIG", "SET", "x", "y"])];
        let err = coordinator.pipeline(&commands).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        // Nothing reached the store
        assert_eq!(connector.execute("EXISTS", &[Arg::from("a")]), Ok(StoreValue::Int(0)));
    }

    #[tokio::test]
    async fn test_pipeline_failures_stay_in_their_slot() {
        let (_, coordinator) = coordinator(FilterPolicy::blocklist());
        let commands = vec![
            cmd(&["SET", "k", "v"]),
            cmd(&["LPUSH", "k", "x"]),
            cmd(&["GET", "k"]),
        ];
        let envelopes = coordinator.pipeline(&commands).await.unwrap();
        assert_eq!(envelopes.len(), 3);
        assert!(!envelopes[0].is_error());
        assert!(envelopes[1].is_error());
        assert_eq!(envelopes[2].to_json(), json!({"result": "v"}));
    }

    #[tokio::test]
    async fn test_transaction_success_and_abort() {
        let (connector, coordinator) = coordinator(FilterPolicy::blocklist());
        let commands = vec![cmd(&["SET", "k", "1"]), cmd(&["INCR", "k"])];
        let envelopes = coordinator.transaction(&commands).await.unwrap();
        assert_eq!(
            envelopes.iter().map(Envelope::to_json).collect::<Vec<_>>(),
            vec![json!({"result": "OK"}), json!({"result": 2})]
        );

        connector.abort_next_transaction();
        let err = coordinator.transaction(&commands).await.unwrap_err();
        assert_eq!(err, ExecutionError::TransactionAborted);
        assert_eq!(Response::from_error(&err).status, 409);
    }

    #[tokio::test]
    async fn test_run_maps_connection_failure_to_503() {
        let (connector, coordinator) = coordinator(FilterPolicy::blocklist());
        coordinator.shutdown().await;
        let response = coordinator
            .run(&ExecutionRequest::Single(cmd(&["PING"])))
            .await;
        assert_eq!(response.status, 503);
        assert!(response.body["error"].as_str().unwrap().contains("shut down"));
        assert_eq!(connector.connect_attempts(), 0);
    }
}
