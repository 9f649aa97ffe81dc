//! CLI argument definitions using clap
//!
//! Commands:
//! - restkv serve [--config <path>] [--memory]
//! - restkv check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// restkv - REST adapter for a key-value store
#[derive(Parser, Debug)]
#[command(name = "restkv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP adapter
    Serve {
        /// JSON configuration file; RESTKV_* environment variables are used when omitted
        #[arg(long, env = "RESTKV_CONFIG")]
        config: Option<PathBuf>,

        /// Serve from the in-process store
        #[arg(long)]
        memory: bool,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig {
        /// JSON configuration file; RESTKV_* environment variables are used when omitted
        #[arg(long, env = "RESTKV_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli =
            Cli::try_parse_from(["restkv", "serve", "--memory", "--config", "a.json"]).unwrap();
        match cli.command {
            Command::Serve { config, memory } => {
                assert!(memory);
                assert_eq!(config, Some(PathBuf::from("a.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::try_parse_from(["restkv", "check-config"]).unwrap();
        assert!(matches!(cli.command, Command::CheckConfig { .. }));
    }
}
