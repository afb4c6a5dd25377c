// vcr-cleaner-core/src/lib.rs
//! # VCR Cleaner Core Library
//!
//! `vcr-cleaner-core` keeps secrets out of recorded HTTP fixtures ("cassettes")
//! while still letting the recordings replay. It plugs into a record/replay
//! library at two points:
//!
//! * **Sanitizing**: right before an exchange is persisted, the configured
//!   hostname, query fields, headers, bodies and form fields are redacted.
//! * **Matching**: when a live request is compared against the recordings,
//!   the same exclusions are applied to both sides so a scrubbed recording
//!   still matches the request that carries the real secret.
//!
//! The library holds no global state. A [`Policy`] is built once from
//! [`PolicyOptions`], frozen, and shared by the [`RelaxedMatcher`] and the
//! [`Sanitizer`].
//!
//! ## Modules
//!
//! * `config`: Policy options, the frozen [`Policy`], and YAML policy files.
//! * `exchange`: Request/response snapshots and the accessor traits hosts implement.
//! * `url_codec`: Lossless URL decomposition and query-field removal.
//! * `headers`: Case-insensitive header filters, redaction and comparison.
//! * `diagnostics`: Transport diagnostics and the raw request-header block.
//! * `scrubbers`: Body and form-field scrubber traits plus regex/field rules.
//! * `matcher`: The five named relaxed-match predicates.
//! * `sanitizer`: The pre-record hook.
//! * `cleaner`: [`VcrCleaner`] and the [`RecorderHost`] registration surface.
//! * `redaction_log`: PII-safe debug logging helpers.
//! * `errors`: The [`CleanerError`] type.
//!
//! ## Usage Example
//!
//! ```rust
//! use vcr_cleaner_core::{PolicyOptions, Request, RequestOptions, Response, VcrCleaner};
//!
//! fn main() -> Result<(), vcr_cleaner_core::CleanerError> {
//!     let cleaner = VcrCleaner::enable(
//!         PolicyOptions::new().request(
//!             RequestOptions::default()
//!                 .ignore_query_field("apiKey")
//!                 .ignore_header("X-Api-Key"),
//!         ),
//!     );
//!
//!     let live = Request::new("GET", "https://example.com/search?q=rust&apiKey=secret")
//!         .with_header("X-Api-Key", "secret");
//!     let mut recorded = live.clone();
//!     let mut response = Response::new(200);
//!
//!     cleaner.sanitizer().on_before_record(&mut recorded, &mut response)?;
//!     assert_eq!(recorded.url, "https://example.com/search?q=rust");
//!     assert_eq!(recorded.headers.get("X-Api-Key"), Some(""));
//!
//!     assert!(cleaner.matcher().matches(&recorded, &live));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Configuration and sanitizing failures are reported as [`CleanerError`].
//! Loading policy files returns `anyhow::Result` with file context attached.
//! Matching never fails: anything that cannot be compared is a mismatch.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod cleaner;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod exchange;
pub mod headers;
pub mod matcher;
pub mod redaction_log;
pub mod sanitizer;
pub mod scrubbers;
pub mod url_codec;

/// Re-exports the policy configuration surface.
pub use config::{
    merge_options, Policy, PolicyFile, PolicyOptions, RequestOptions, RequestSection, ResponseOptions,
    ResponseSection, MAX_PATTERN_LENGTH,
};

pub use errors::CleanerError;

/// Re-exports the host-facing data model.
pub use exchange::{
    Exchange, FormFields, Headers, Request, RequestHandle, Response, ResponseHandle, ResponseParts, ResponseStatus,
};

pub use diagnostics::{RawHeaderBlock, RawLine, TransportInfo};

pub use headers::HeaderFilter;

/// Re-exports scrubber traits and the declarative rules.
pub use scrubbers::{BodyScrubber, BodyScrubbers, FieldRule, FieldScrubber, FieldScrubbers, RegexScrubber, ScrubRule};

pub use url_codec::{decompose, rebuild, UrlParts, REDACTED_HOST};

pub use matcher::{MatcherKind, RelaxedMatcher};
pub use sanitizer::Sanitizer;
pub use cleaner::{BeforeRecordHook, RecorderHost, RequestMatcherFn, VcrCleaner};

pub use redaction_log::redact_sensitive;
