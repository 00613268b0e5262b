//! CLI module for transitadmin
//!
//! Provides command-line interface for:
//! - serve: Load config, install logging and serve the admin API
//! - check-config: Validate a config file
//! - resources: Describe the resource catalog

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{build_state, check_config, list_resources, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
