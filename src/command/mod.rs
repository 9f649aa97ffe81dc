//! # Command Module
//!
//! Canonical command model and the parsers that produce it from
//! path segments, JSON bodies, hybrid requests and batches.

pub mod errors;
pub mod parser;
pub mod types;

pub use errors::{ParseError, ParseResult};
pub use parser::{parse_batch, parse_body_command, parse_hybrid_command, parse_path_command};
pub use types::{Arg, Command, ExecutionRequest};
