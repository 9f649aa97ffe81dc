//! # Executor Module
//!
//! The execution coordinator and the error taxonomy it reports through.
//!
//! # Modes
//!
//! - single: one command, one envelope
//! - pipeline: N commands, N independent envelopes in input order
//! - transaction: N commands, N success envelopes or one error

mod coordinator;
mod errors;

pub use coordinator::{ExecutionCoordinator, Response};
pub use errors::{ExecutionError, ExecutionResult};
