//! CLI command implementations
//!
//! `serve` boots in a fixed order:
//! 1. Configuration load and validation
//! 2. Logging
//! 3. Resource catalog
//! 4. Store, permissions and admin service
//! 5. HTTP server on a tokio runtime

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use crate::admin::{AdminService, JsonViewRenderer};
use crate::auth::OwnershipPolicy;
use crate::config::AppConfig;
use crate::http_server::{AdminState, HttpServer};
use crate::observability::logging;
use crate::resources;
use crate::store::MemoryStore;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config),
        Command::CheckConfig { config } => check_config(&config, &mut io::stdout().lock()),
        Command::Resources => list_resources(&mut io::stdout().lock()),
    }
}

/// Everything the HTTP layer needs, wired from a validated config
pub fn build_state(config: &AppConfig) -> CliResult<AdminState> {
    let registry = Arc::new(resources::catalog()?);
    let permissions = OwnershipPolicy::new(config.grant_table()?, &registry);

    let service = AdminService::new(
        Arc::clone(&registry),
        Arc::new(MemoryStore::new()),
        Arc::new(permissions),
    )
    .with_listing(config.listing.clone())
    .with_batch_size(config.bulk.batch_size);

    Ok(AdminState::new(service, Arc::new(JsonViewRenderer)))
}

/// Boot and serve until the process stops
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    logging::init(&config.logging.level, config.logging.mode)?;

    let state = build_state(&config)?;
    tracing::info!(
        config = %config_path.display(),
        resources = state.service.registry().len(),
        "booted"
    );

    let server = HttpServer::new(config.server.clone(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate a config file and print it with every default filled in
pub fn check_config(config_path: &Path, out: &mut impl Write) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    serde_json::to_writer_pretty(&mut *out, &config)?;
    writeln!(out)?;
    Ok(())
}

/// Print the resource catalog as JSON
pub fn list_resources(out: &mut impl Write) -> CliResult<()> {
    let registry = resources::catalog()?;
    let catalog: Vec<_> = registry
        .iter()
        .map(|d| {
            json!({
                "name": d.name(),
                "plural": d.plural(),
                "listable": d.listable(),
                "searchable": d.searchable(),
                "fillable": d.fillable(),
                "delete_policy": d.delete_policy(),
                "bulk_authorization": d.bulk_authorization(),
            })
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &catalog)?;
    writeln!(out)?;
    Ok(())
}
