// vcr-cleaner/src/commands/sanitize.rs
//! `sanitize`: runs the pre-record hook over one recorded exchange.
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};

use vcr_cleaner_core::{Exchange, VcrCleaner};

use crate::cli::{DocumentFormat, SanitizeCommand};
use crate::commands::{load_policy, read_input};

pub fn run_sanitize(cmd: &SanitizeCommand) -> Result<()> {
    info!("Starting sanitize operation.");
    let cleaner = VcrCleaner::enable(load_policy(&cmd.policy)?);

    let input_format = cmd
        .format
        .or_else(|| cmd.input.as_deref().and_then(DocumentFormat::from_path))
        .unwrap_or(DocumentFormat::Json);
    let output_format = cmd
        .format
        .or_else(|| cmd.output.as_deref().and_then(DocumentFormat::from_path))
        .unwrap_or(input_format);

    let input = read_input(cmd.input.as_deref())?;
    let sanitized = sanitize_document(&cleaner, &input, input_format, output_format)?;

    match &cmd.output {
        Some(path) => {
            fs::write(path, &sanitized)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            info!("Sanitized exchange written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(sanitized.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Parses an exchange, sanitizes it and renders the result.
pub fn sanitize_document(
    cleaner: &VcrCleaner,
    input: &str,
    input_format: DocumentFormat,
    output_format: DocumentFormat,
) -> Result<String> {
    let mut exchange: Exchange = input_format.parse(input).context("Failed to parse exchange")?;
    debug!(
        "Parsed exchange: {} {} -> {}",
        exchange.request.method,
        vcr_cleaner_core::redaction_log::loggable(&exchange.request.url),
        exchange.response.status.code
    );

    cleaner
        .sanitizer()
        .on_before_record(&mut exchange.request, &mut exchange.response)
        .context("Failed to sanitize exchange")?;

    output_format.render(&exchange)
}
