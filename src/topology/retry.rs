//! Connect retry with linear, capped backoff.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::client::{ConnectSpec, StoreConnection, StoreConnector};
use super::errors::{TopologyError, TopologyResult};

/// Backoff policy for connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_millis(200),
            cap: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        (self.step * attempt).min(self.cap)
    }
}

/// Open a connection, retrying per `policy`. Each attempt is bounded by the
/// spec's connect timeout.
pub async fn connect_with_retry(
    connector: &dyn StoreConnector,
    spec: &ConnectSpec,
    policy: &RetryPolicy,
) -> TopologyResult<Arc<dyn StoreConnection>> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match tokio::time::timeout(spec.connect_timeout, connector.connect(spec)).await {
            Ok(Ok(conn)) => {
                debug!(attempt, "store connection established");
                return Ok(conn);
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => {
                last_error = format!(
                    "connect timed out after {}ms",
                    spec.connect_timeout.as_millis()
                )
            }
        }

        if attempt < attempts {
            let delay = policy.delay(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "store connect attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    warn!(attempts, error = %last_error, "giving up on store connection");
    Err(TopologyError::connection(format!(
        "failed to connect after {} attempts: {}",
        attempts, last_error
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use crate::topology::client::Endpoint;

    fn spec() -> ConnectSpec {
        ConnectSpec {
            endpoint: Endpoint::Standalone {
                url: "memory://".to_string(),
            },
            connect_timeout: Duration::from_millis(500),
            command_timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_delay_is_linear_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(10), Duration::from_millis(2000));
        assert_eq!(policy.delay(50), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_attempts() {
        let connector = MemoryConnector::new();
        connector.fail_next_connects(2);

        let start = tokio::time::Instant::now();
        let conn = connect_with_retry(&connector, &spec(), &RetryPolicy::default()).await;
        assert!(conn.is_ok());
        assert_eq!(connector.connect_attempts(), 3);
        // 200ms + 400ms of backoff
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let connector = MemoryConnector::new();
        connector.fail_next_connects(5);

        let result = connect_with_retry(&connector, &spec(), &RetryPolicy::default()).await;
        match result {
            Err(TopologyError::Connection(msg)) => assert!(msg.contains("3 attempts")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connect should have failed"),
        }
        assert_eq!(connector.connect_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_connect_times_out() {
        let connector = MemoryConnector::new();
        connector.set_connect_delay(Duration::from_secs(10));

        let result = connect_with_retry(&connector, &spec(), &RetryPolicy::default()).await;
        match result {
            Err(TopologyError::Connection(msg)) => assert!(msg.contains("timed out")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connect should have timed out"),
        }
    }
}
