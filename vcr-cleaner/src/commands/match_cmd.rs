// vcr-cleaner/src/commands/match_cmd.rs
//! `match`: reports each relaxed matcher's verdict for a recorded request and
//! a live one.
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

use vcr_cleaner_core::{Exchange, MatcherKind, RelaxedMatcher, Request, VcrCleaner};

use crate::cli::{DocumentFormat, MatchCommand};
use crate::commands::{load_policy, read_input};

/// A request on its own, or the request half of a recorded exchange.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestDocument {
    Exchange(Exchange),
    Request(Request),
}

impl RequestDocument {
    fn into_request(self) -> Request {
        match self {
            RequestDocument::Exchange(exchange) => exchange.request,
            RequestDocument::Request(request) => request,
        }
    }
}

/// Writes one `name: ok|mismatch` line per matcher and returns whether all
/// of them matched.
pub fn run_match<W: Write>(cmd: &MatchCommand, out: &mut W) -> Result<bool> {
    info!("Starting match operation.");
    let cleaner = VcrCleaner::enable(load_policy(&cmd.policy)?);

    let recorded = load_request(&cmd.recorded)?;
    let live = load_request(&cmd.live)?;

    write_report(cleaner.matcher(), &recorded, &live, out)
}

pub fn write_report<W: Write>(matcher: &RelaxedMatcher, recorded: &Request, live: &Request, out: &mut W) -> Result<bool> {
    let report = matcher.report(recorded, live);
    for (kind, matched) in &report {
        writeln!(out, "{}: {}", kind, if *matched { "ok" } else { "mismatch" })?;
    }
    let agreed = report.iter().filter(|(_, matched)| *matched).count();
    info!("{} of {} matchers agree.", agreed, MatcherKind::ALL.len());
    Ok(agreed == report.len())
}

fn load_request(path: &Path) -> Result<Request> {
    let format = DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Json);
    let text = read_input(Some(path))?;
    let document: RequestDocument = format
        .parse(&text)
        .with_context(|| format!("Failed to parse request from {}", path.display()))?;
    Ok(document.into_request())
}
