//! # Memory Module
//!
//! In-process implementation of the store client capability. Used by the
//! `--memory` serve mode and throughout the test suite.

pub mod connection;
pub mod store;

pub use connection::{MemoryConnection, MemoryConnector};
pub use store::{MemoryStore, NOT_AN_INTEGER, WRONGTYPE};
