//! Process-wide `tracing` subscriber setup

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Output format
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Default,
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to init logger: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Check a filter directive such as `info` or `transitadmin=debug,audit=info`
pub fn parse_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    Ok(EnvFilter::from_str(level)?)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(level: &str, mode: LogMode) -> Result<(), LoggingError> {
    let env_filter = parse_filter(level)?;

    match mode {
        LogMode::Default => tracing_subscriber::fmt()
            .with_line_number(true)
            .with_file(true)
            .with_env_filter(env_filter)
            .finish()
            .try_init()?,
        LogMode::Json => tracing_subscriber::fmt()
            .json()
            .with_line_number(true)
            .with_file(true)
            .with_env_filter(env_filter)
            .finish()
            .try_init()?,
        LogMode::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_line_number(true)
            .with_file(true)
            .with_env_filter(env_filter)
            .finish()
            .try_init()?,
        LogMode::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .finish()
            .try_init()?,
    }

    Ok(())
}
