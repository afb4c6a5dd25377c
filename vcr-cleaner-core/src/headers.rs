// vcr-cleaner-core/src/headers.rs
//! Case-insensitive header redaction and comparison.
//!
//! Ignore directives may be written in any casing. They are resolved against
//! the stored header names through a lowercase index, so redacted output
//! keeps the casing the client actually sent.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use log::debug;

use crate::exchange::Headers;
use crate::redaction_log::log_header_redaction_debug;

/// Directive that selects every header.
pub const WILDCARD: &str = "*";

/// Which headers an ignore list selects, decided once when a policy is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFilter {
    All,
    Named(Vec<String>),
}

impl Default for HeaderFilter {
    fn default() -> Self {
        HeaderFilter::Named(Vec::new())
    }
}

impl HeaderFilter {
    /// A wildcard anywhere in `directives` selects all headers and the other
    /// names are dropped.
    pub fn from_directives<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        for directive in directives {
            let directive = directive.into();
            if directive == WILDCARD {
                return HeaderFilter::All;
            }
            if !names.iter().any(|n: &String| n.eq_ignore_ascii_case(&directive)) {
                names.push(directive);
            }
        }
        HeaderFilter::Named(names)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, HeaderFilter::All)
    }

    /// True when the filter selects nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, HeaderFilter::Named(names) if names.is_empty())
    }

    /// This filter with `name` selected as well.
    pub fn including(&self, name: &str) -> HeaderFilter {
        match self {
            HeaderFilter::All => HeaderFilter::All,
            HeaderFilter::Named(names) => {
                HeaderFilter::from_directives(names.iter().map(String::as_str).chain(std::iter::once(name)))
            }
        }
    }

    /// Whether `header` is selected, ignoring case.
    pub fn selects(&self, header: &str) -> bool {
        match self {
            HeaderFilter::All => true,
            HeaderFilter::Named(names) => names.iter().any(|n| n.eq_ignore_ascii_case(header)),
        }
    }
}

/// Maps each lowercased header name to the name as stored.
///
/// When the same name is stored under several casings, the first one wins.
pub fn build_case_index(headers: &Headers) -> HashMap<String, String> {
    let mut index = HashMap::with_capacity(headers.len());
    for key in headers.keys() {
        index
            .entry(key.to_ascii_lowercase())
            .or_insert_with(|| key.to_string());
    }
    index
}

/// Blanks the value of every selected header. Keys are always kept, so a
/// recording shows which headers were sent without revealing their values.
/// Directives naming absent headers are ignored.
pub fn redact_headers(headers: &mut Headers, filter: &HeaderFilter) {
    match filter {
        HeaderFilter::All => {
            for (key, value) in headers.values_mut() {
                log_header_redaction_debug("headers", key, value);
                value.clear();
            }
        }
        HeaderFilter::Named(names) => {
            let index = build_case_index(headers);
            for name in names {
                let Some(stored) = index.get(&name.to_ascii_lowercase()) else {
                    debug!("headers: directive '{}' matches no header, skipping", name);
                    continue;
                };
                if let Some(original) = headers.get(stored) {
                    log_header_redaction_debug("headers", stored, original);
                }
                headers.set(stored, "");
            }
        }
    }
}

/// Compares two header lists after dropping every selected header from
/// independent copies of each.
///
/// Surviving entries must match exactly, names included: a header that
/// differs only in casing is a mismatch. Order does not matter.
pub fn headers_equal_ignoring(a: &Headers, b: &Headers, filter: &HeaderFilter) -> bool {
    let remaining = |headers: &Headers| -> Vec<(String, String)> {
        let mut kept = headers.clone();
        kept.retain(|key, _| !filter.selects(key));
        let mut entries: Vec<(String, String)> = kept
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.sort();
        entries
    };

    remaining(a) == remaining(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_wildcard_anywhere_selects_all() {
        let filter = HeaderFilter::from_directives(["X-Api-Key", "*", "Cookie"]);
        assert_eq!(filter, HeaderFilter::All);
        assert!(filter.selects("Anything"));
    }

    #[test]
    fn test_named_filter_is_case_insensitive() {
        let filter = HeaderFilter::from_directives(["x-api-key"]);
        assert!(filter.selects("X-API-KEY"));
        assert!(!filter.selects("X-Type"));
    }

    #[test]
    fn test_including_adds_name_once() {
        let filter = HeaderFilter::from_directives(["host"]).including("Host");
        assert_eq!(filter, HeaderFilter::Named(vec!["host".to_string()]));
        assert_eq!(HeaderFilter::All.including("Host"), HeaderFilter::All);
    }

    #[test]
    fn test_case_index_keeps_original_key() {
        let index = build_case_index(&headers(&[("X-Api-Key", "a"), ("Accept", "b")]));
        assert_eq!(index.get("x-api-key").map(String::as_str), Some("X-Api-Key"));
    }

    #[test]
    fn test_redact_named_blanks_value_keeps_key() {
        let mut h = headers(&[("X-Api-Key", "SuperToast"), ("X-Type", "application/vcr")]);
        redact_headers(&mut h, &HeaderFilter::from_directives(["x-api-key", "X-Missing"]));
        assert_eq!(h.get("X-Api-Key"), Some(""));
        assert_eq!(h.get("X-Type"), Some("application/vcr"));
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["X-Api-Key", "X-Type"]);
    }

    #[test]
    fn test_redact_wildcard_blanks_every_value() {
        let mut h = headers(&[("X-Api-Key", "SuperToast"), ("X-Type", "application/vcr")]);
        redact_headers(&mut h, &HeaderFilter::All);
        assert_eq!(h.len(), 2);
        assert!(h.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_equal_ignoring_named() {
        let a = headers(&[("X-API-KEY", "SomethingSensitive"), ("X-Header", "something-not-secret")]);
        let b = headers(&[("X-Header", "something-not-secret")]);
        assert!(!headers_equal_ignoring(&a, &b, &HeaderFilter::default()));
        assert!(headers_equal_ignoring(&a, &b, &HeaderFilter::from_directives(["X-API-KEY"])));
        assert!(headers_equal_ignoring(&b, &a, &HeaderFilter::from_directives(["x-api-key"])));
    }

    #[test]
    fn test_equal_ignoring_all() {
        let a = headers(&[("X-API-KEY", "SomethingSensitive")]);
        assert!(headers_equal_ignoring(&a, &Headers::new(), &HeaderFilter::All));
    }

    #[test]
    fn test_surviving_casing_is_significant() {
        let a = headers(&[("Accept", "json")]);
        let b = headers(&[("accept", "json")]);
        assert!(!headers_equal_ignoring(&a, &b, &HeaderFilter::default()));
    }

    #[test]
    fn test_equal_ignoring_does_not_mutate_inputs() {
        let a = headers(&[("X-Api-Key", "1")]);
        let before = a.clone();
        headers_equal_ignoring(&a, &a, &HeaderFilter::All);
        assert_eq!(a, before);
    }
}
