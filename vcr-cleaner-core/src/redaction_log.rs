// vcr-cleaner-core/src/redaction_log.rs
//! PII-safe debug logging helpers for redaction events.
//!
//! The engine logs every value it blanks or removes at `debug` level. The
//! values themselves are secrets by definition, so they are masked unless
//! `VCR_CLEANER_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("VCR_CLEANER_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Masks a sensitive value, keeping only a hint about its size.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

/// Returns the value itself when PII debugging is enabled, a mask otherwise.
pub fn loggable(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_header_redaction_debug(target: &str, header: &str, original_value: &str) {
    debug!(
        "{} Blanked header '{}' (original): '{}'",
        target,
        header,
        loggable(original_value)
    );
}

pub fn log_query_field_removal_debug(target: &str, field: &str, original_value: &str) {
    debug!(
        "{} Removed query field '{}' (original): '{}'",
        target,
        field,
        loggable(original_value)
    );
}

pub fn log_host_redaction_debug(target: &str, original_host: &str, replacement: &str) {
    debug!(
        "{} Host redaction: Original='{}', Redacted='{}'",
        target,
        loggable(original_host),
        replacement
    );
}
