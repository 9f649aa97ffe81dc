//! restkv - HTTP REST adapter for a key-value store
//!
//! Requests arrive as path segments, JSON arrays, JSON objects or batches.
//! Each is normalized into a [`command::Command`], checked by the
//! [`filter::FilterPolicy`], dispatched through the
//! [`topology::TopologyManager`] and serialized into `{"result": ...}` /
//! `{"error": ...}` envelopes.
//!
//! The store itself is reached through the [`topology::StoreConnector`]
//! and [`topology::StoreConnection`] traits; [`memory`] provides an
//! in-process implementation.

pub mod cli;
pub mod command;
pub mod config;
pub mod executor;
pub mod filter;
pub mod http_server;
pub mod memory;
pub mod observability;
pub mod serializer;
pub mod topology;
