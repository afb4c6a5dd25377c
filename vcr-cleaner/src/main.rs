// vcr-cleaner/src/main.rs
//! vcr-cleaner entry point.
//!
//! Parses the command line, initializes logging and dispatches to the
//! requested command.

use anyhow::Result;
use clap::Parser;
use std::io;

use vcr_cleaner::cli::{Cli, Commands};
use vcr_cleaner::commands::{match_cmd, sanitize};
use vcr_cleaner::logger;

fn main() -> Result<()> {
    let args = Cli::parse();
    logger::init_logger(logger::level_for_flags(args.quiet, args.debug));

    match &args.command {
        Commands::Sanitize(cmd) => sanitize::run_sanitize(cmd)?,
        Commands::Match(cmd) => {
            let all_matched = match_cmd::run_match(cmd, &mut io::stdout().lock())?;
            if !all_matched {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
