//! # Application Configuration
//!
//! JSON config file read once at boot. Every section and field has a
//! default, so `{}` is a complete config.
//!
//! ```json
//! {
//!   "server": { "host": "0.0.0.0", "port": 8000, "cors_origins": [] },
//!   "listing": { "default_per_page": 10, "max_per_page": 100 },
//!   "bulk": { "batch_size": 1000 },
//!   "logging": { "level": "info", "mode": "json" },
//!   "grants": { "dispatcher": ["admin.ticket.*", "admin.schedule.index"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::DEFAULT_BATCH_SIZE;
use crate::auth::{AuthError, GrantTable};
use crate::http_server::HttpServerConfig;
use crate::listing::ListingConfig;
use crate::observability::{logging, LogMode, LoggingError};

/// Result type for config loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid grants: {0}")]
    Grants(#[from] AuthError),

    #[error("Invalid logging level: {0}")]
    Logging(#[from] LoggingError),
}

/// Bulk destroy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `transitadmin=debug`
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub mode: LogMode,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            mode: LogMode::default(),
        }
    }
}

/// The whole config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Caller id -> permission patterns
    #[serde(default)]
    pub grants: BTreeMap<String, Vec<String>>,
}

impl AppConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_addr().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server address '{}' is not a socket address",
                self.server.socket_addr()
            )));
        }

        if self.listing.default_per_page == 0 || self.listing.max_per_page == 0 {
            return Err(ConfigError::Invalid("listing page sizes must be > 0".to_string()));
        }
        if self.listing.default_per_page > self.listing.max_per_page {
            return Err(ConfigError::Invalid(format!(
                "listing.default_per_page ({}) exceeds listing.max_per_page ({})",
                self.listing.default_per_page, self.listing.max_per_page
            )));
        }

        if self.bulk.batch_size == 0 {
            return Err(ConfigError::Invalid("bulk.batch_size must be > 0".to_string()));
        }

        logging::parse_filter(&self.logging.level)?;
        self.grant_table()?;

        Ok(())
    }

    /// The permission table the `grants` section describes
    pub fn grant_table(&self) -> ConfigResult<GrantTable> {
        Ok(GrantTable::from_config(&self.grants)?)
    }
}
