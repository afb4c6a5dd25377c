// vcr-cleaner/src/commands/mod.rs
//! Command implementations and the document I/O they share.
//! License: MIT OR APACHE 2.0

pub mod match_cmd;
pub mod sanitize;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use vcr_cleaner_core::{merge_options, PolicyFile, PolicyOptions, RequestOptions};

use crate::cli::{DocumentFormat, PolicyArgs};

/// Builds the policy options: the policy file (if any), overlaid with the
/// command-line flags that were actually given.
pub fn load_policy(args: &PolicyArgs) -> Result<PolicyOptions> {
    let base = match &args.policy {
        Some(path) => {
            let file = PolicyFile::load_from_file(path)?;
            file.compile()
                .with_context(|| format!("Failed to compile policy file {}", path.display()))?
        }
        None => {
            info!("No policy file given; starting from the default policy.");
            PolicyOptions::new()
        }
    };

    let mut overlay = RequestOptions::default();
    if args.ignore_hostname {
        overlay = overlay.ignore_hostname(true);
    }
    for field in &args.ignore_query_fields {
        overlay = overlay.ignore_query_field(field.clone());
    }
    for header in &args.ignore_headers {
        overlay = overlay.ignore_header(header.clone());
    }

    Ok(merge_options(base, PolicyOptions::new().request(overlay)))
}

impl DocumentFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T> {
        match self {
            DocumentFormat::Json => serde_json::from_str(text).context("Invalid JSON document"),
            DocumentFormat::Yaml => serde_yaml::from_str(text).context("Invalid YAML document"),
        }
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            DocumentFormat::Json => {
                let mut text = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
                text.push('\n');
                Ok(text)
            }
            DocumentFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize YAML"),
        }
    }
}

/// Reads a document from `path`, or from stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}
