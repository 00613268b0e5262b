//! transitadmin CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, and exits non-zero on
//! failure. Configuration, logging and the server are all set up there.

use transitadmin::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
