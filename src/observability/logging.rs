//! Subscriber setup

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    #[error("invalid log level '{level}': {message}")]
    InvalidLevel { level: String, message: String },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: &str, json: bool) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
            level: level.to_string(),
            message: e.to_string(),
        })?,
    };

    let subscriber = tracing_subscriber::registry().with(filter);
    let installed = if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
