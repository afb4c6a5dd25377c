//! errors.rs - Custom error types for the vcr-cleaner-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that a host recorder can handle
//! programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `vcr-cleaner-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CleanerError {
    #[error("Invalid cleaner policy: {0}")]
    Configuration(String),

    #[error("Failed to compile body scrubber '{0}': {1}")]
    InvalidScrubberPattern(String, regex::Error),

    #[error("Body scrubber '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Malformed URL '{0}': no scheme or authority could be identified")]
    MalformedUrl(String),

    /// A user-supplied scrubber failed. The exchange must not be recorded.
    #[error("Scrubber failed while sanitizing the {stage}: {source}")]
    Scrubber {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CleanerError {
    pub(crate) fn scrubber(stage: &'static str, source: anyhow::Error) -> Self {
        CleanerError::Scrubber { stage, source }
    }
}
