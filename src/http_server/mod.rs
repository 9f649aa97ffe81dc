//! # HTTP Server Module
//!
//! REST surface for the adapter. Routing, the bearer token gate and the
//! mapping from execution outcomes to HTTP status codes live here; command
//! semantics stay in the coordinator.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/` - Single command from a JSON body
//! - `/pipeline` - Non-atomic batch
//! - `/multi-exec` - Atomic batch
//! - `/<command>/<arg>/...` - Command from path segments

pub mod auth;
pub mod config;
pub mod routes;
pub mod server;

pub use auth::{AuthDecision, AuthGate};
pub use config::HttpServerConfig;
pub use routes::{command_routes, AppState, SharedState};
pub use server::HttpServer;
