//! CLI module for restkv
//!
//! Provides command-line interface for:
//! - serve: load configuration and run the HTTP adapter
//! - check-config: validate configuration and print it

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, load_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
