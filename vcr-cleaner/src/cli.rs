// vcr-cleaner/src/cli.rs
//! This file defines the command-line interface (CLI) for the vcr-cleaner
//! application, including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "vcr-cleaner",
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "Sanitize recorded HTTP exchanges and check relaxed request matches",
    long_about = "vcr-cleaner applies a redaction policy to recorded HTTP exchanges before they are committed as test fixtures, and checks whether a live request would still replay against a sanitized recording.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes one recorded exchange (`{request, response}`).
    #[command(about = "Sanitizes a recorded exchange read from a file or stdin.")]
    Sanitize(SanitizeCommand),

    /// Runs every relaxed matcher against a recorded and a live request.
    #[command(about = "Checks whether a live request matches a recorded one under the policy.")]
    Match(MatchCommand),
}

/// Policy source plus command-line overrides, shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Path to a policy file (YAML or JSON).
    #[arg(long, short = 'p', value_name = "FILE", env = "VCR_CLEANER_POLICY", help = "Path to a policy file (YAML or JSON).")]
    pub policy: Option<PathBuf>,

    #[arg(long = "ignore-hostname", help = "Redact the hostname and ignore it when matching.")]
    pub ignore_hostname: bool,

    #[arg(long = "ignore-query-field", value_name = "NAME", help = "Query field to strip and ignore (repeatable).")]
    pub ignore_query_fields: Vec<String>,

    #[arg(long = "ignore-header", value_name = "NAME", help = "Request header to blank and ignore (repeatable, '*' for all).")]
    pub ignore_headers: Vec<String>,
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read the exchange from a file instead of stdin.")]
    pub input: Option<PathBuf>,

    /// Write the sanitized exchange to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Document format; guessed from the file extension when omitted.
    #[arg(long, short = 'f', value_enum, help = "Document format (defaults to the input extension, JSON for stdin).")]
    pub format: Option<DocumentFormat>,
}

/// Arguments for the `match` command.
#[derive(Parser, Debug)]
pub struct MatchCommand {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// The recorded request (or exchange).
    #[arg(value_name = "RECORDED")]
    pub recorded: PathBuf,

    /// The live request (or exchange).
    #[arg(value_name = "LIVE")]
    pub live: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    Yaml,
}
