//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::executor::ExecutionCoordinator;
use crate::http_server::{AuthGate, HttpServer};
use crate::memory::MemoryConnector;
use crate::observability::init_logging;
use crate::topology::StoreConnector;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, memory } => serve(config.as_deref(), memory),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Load from `path` when given, otherwise from `RESTKV_*` environment variables
pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_lookup(|key| std::env::var(key).ok())?,
    };
    Ok(config)
}

/// Print the effective configuration with the auth token masked
pub fn check_config(path: Option<&Path>) -> CliResult<()> {
    let mut config = load_config(path)?;
    if config.auth_token.is_some() {
        config.auth_token = Some("********".to_string());
    }
    write_json(&serde_json::to_value(&config)?)
}

/// Start the HTTP adapter and block until it shuts down
pub fn serve(path: Option<&Path>, memory: bool) -> CliResult<()> {
    let config = load_config(path)?;
    init_logging(&config.log.level, config.log.json)?;

    // No network store client ships with the binary
    if !memory {
        return Err(CliError::config_error(
            "no store client is available for the configured store; \
             start with --memory to use the in-process store",
        ));
    }

    let connector: Arc<dyn StoreConnector> = Arc::new(MemoryConnector::new());
    let coordinator = Arc::new(ExecutionCoordinator::from_config(connector, &config.store));
    info!(
        filter = config.store.filter.mode.as_str(),
        pool = config.store.pool.enabled,
        cluster = config.store.cluster.enabled,
        "starting restkv with the in-process store"
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let server = HttpServer::new(
            config.http.clone(),
            coordinator,
            AuthGate::new(config.auth_token.clone()),
        );
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}
