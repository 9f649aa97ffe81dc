//! # Filter Module
//!
//! Command safety policy applied to every command in every execution mode.

pub mod policy;
pub mod sets;

pub use policy::{decide, FilterDecision, FilterMode, FilterPolicy};
pub use sets::{DANGEROUS_COMMANDS, SAFE_COMMANDS};
