//! Observability for restkv
//!
//! Structured logging through `tracing`. Library code only emits events;
//! the binary installs the subscriber once at startup.

mod logging;

pub use logging::{init_logging, LoggingError};
