//! CLI argument definitions using clap
//!
//! Commands:
//! - transitadmin serve --config <path>
//! - transitadmin check-config --config <path>
//! - transitadmin resources

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// transitadmin - admin back office for tickets, schedules and offices
#[derive(Parser, Debug)]
#[command(name = "transitadmin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the admin HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./transitadmin.json")]
        config: PathBuf,
    },

    /// Load and validate a configuration file, then print it resolved
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./transitadmin.json")]
        config: PathBuf,
    },

    /// Print the registered resource catalog
    Resources,
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
    fn test_serve_default_config_path() {
        let cli = Cli::try_parse_from(["transitadmin", "serve"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Serve {
                config: PathBuf::from("./transitadmin.json")
            }
        );
    }

    #[test]
    fn test_check_config_path() {
        let cli =
            Cli::try_parse_from(["transitadmin", "check-config", "--config", "/etc/ta.json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::CheckConfig {
                config: PathBuf::from("/etc/ta.json")
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(Cli::try_parse_from(["transitadmin", "init"]).is_err());
    }
}
