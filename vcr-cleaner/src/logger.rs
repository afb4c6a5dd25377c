// vcr-cleaner/src/logger.rs
//! Logger setup for the command-line host. Logs go to stderr so stdout
//! carries only the sanitized document or the match report.
//! License: MIT OR APACHE 2.0

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes `env_logger` from `RUST_LOG` (default `warn`). A `level`
/// forces that level for every module.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None);
    // A logger may already be installed when running under a test harness.
    builder.try_init().ok();
}

/// Maps the `--quiet` / `--debug` flags to a forced level.
pub fn level_for_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
