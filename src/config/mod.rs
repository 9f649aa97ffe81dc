//! # Config Module
//!
//! [`CoreConfig`] is what the execution core consumes. [`AppConfig`] wraps it
//! with the HTTP, auth and logging settings and knows how to load itself.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{ConfigError, ConfigResult};
pub use loader::{AppConfig, LogConfig};
pub use types::{ClusterSettings, CoreConfig, FilterConfig, PoolConfig};
