// vcr-cleaner-core/src/diagnostics.rs
//! Transport-level diagnostic metadata attached to a recorded response.
//!
//! HTTP client transports often record a second copy of the request next to
//! the response: the effective URL, the peer address and the raw request
//! header block as sent on the wire. Those copies leak the same secrets as the
//! request itself, so the sanitizer rewrites them too. This module provides
//! the data type and a line-oriented model of the raw header block.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder written in place of a redacted value in a raw header line.
pub const BLANK_HEADER_VALUE: &str = "''";

/// Diagnostic metadata recorded by the transport. Keys the engine does not
/// know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Address of the peer the transport connected to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
    /// Raw request header block, request line first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_header: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One line of a raw header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    /// `METHOD target VERSION`
    Request {
        method: String,
        target: String,
        version: String,
    },
    /// `Name:<rest>`, where `rest` keeps its original leading whitespace.
    Header { name: String, rest: String },
    /// Anything else, including the blank lines that terminate the block.
    Other(String),
}

impl RawLine {
    fn parse_header(line: &str) -> RawLine {
        match line.split_once(':') {
            Some((name, rest)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                RawLine::Header {
                    name: name.to_string(),
                    rest: rest.to_string(),
                }
            }
            _ => RawLine::Other(line.to_string()),
        }
    }

    fn parse_request_line(line: &str) -> RawLine {
        let fields: Vec<&str> = line.split(' ').collect();
        match fields.as_slice() {
            [method, target, version] if !method.is_empty() && !target.is_empty() => RawLine::Request {
                method: method.to_string(),
                target: target.to_string(),
                version: version.to_string(),
            },
            _ => RawLine::Other(line.to_string()),
        }
    }
}

/// A raw header block split into lines.
///
/// The value of a header line is everything after the first colon, so a
/// value that itself contains colons (a `Host` with a port, a URL) is never
/// split a second time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeaderBlock {
    separator: &'static str,
    pub lines: Vec<RawLine>,
}

impl RawHeaderBlock {
    pub fn parse(raw: &str) -> Self {
        let separator = if raw.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines = Vec::new();
        for (index, line) in raw.split(separator).enumerate() {
            if index == 0 {
                lines.push(RawLine::parse_request_line(line));
            } else {
                lines.push(RawLine::parse_header(line));
            }
        }
        RawHeaderBlock { separator, lines }
    }
}

impl fmt::Display for RawHeaderBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str(self.separator)?;
            }
            match line {
                RawLine::Request { method, target, version } => {
                    write!(f, "{} {} {}", method, target, version)?
                }
                RawLine::Header { name, rest } => write!(f, "{}:{}", name, rest)?,
                RawLine::Other(text) => f.write_str(text)?,
            }
        }
        Ok(())
    }
}

/// Trims the leading whitespace kept in a header line's `rest`.
pub fn header_value(rest: &str) -> &str {
    rest.trim_start()
}

/// Rebuilds a header line's `rest` with a new value, keeping the original
/// separator spacing.
pub fn with_header_value(rest: &str, value: &str) -> String {
    let padding = &rest[..rest.len() - rest.trim_start().len()];
    format!("{}{}", padding, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "GET /search?apiKey=abc&q=keyword HTTP/1.1\r\nHost: 127.0.0.1:61234\r\nX-Api-Key: SuperToast\r\nX-Url:http://a:b@c\r\n\r\n";

    #[test]
    fn test_parse_and_display_round_trip() {
        let block = RawHeaderBlock::parse(RAW);
        assert_eq!(block.to_string(), RAW);
    }

    #[test]
    fn test_parse_splits_values_at_first_colon_only() {
        let block = RawHeaderBlock::parse(RAW);
        assert_eq!(
            block.lines[0],
            RawLine::Request {
                method: "GET".to_string(),
                target: "/search?apiKey=abc&q=keyword".to_string(),
                version: "HTTP/1.1".to_string(),
            }
        );
        assert_eq!(
            block.lines[1],
            RawLine::Header { name: "Host".to_string(), rest: " 127.0.0.1:61234".to_string() }
        );
        assert_eq!(
            block.lines[3],
            RawLine::Header { name: "X-Url".to_string(), rest: "http://a:b@c".to_string() }
        );
        assert_eq!(block.lines[4], RawLine::Other(String::new()));
    }

    #[test]
    fn test_with_header_value_keeps_padding() {
        assert_eq!(with_header_value(" SuperToast", BLANK_HEADER_VALUE), " ''");
        assert_eq!(with_header_value("tight", "x"), "x");
        assert_eq!(header_value("   spaced"), "spaced");
    }

    #[test]
    fn test_transport_info_keeps_unknown_keys() {
        let json = r#"{"url":"http://example.com/","primary_ip":"93.184.216.34","total_time":0.25}"#;
        let info: TransportInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.primary_ip.as_deref(), Some("93.184.216.34"));
        assert_eq!(info.extra.get("total_time"), Some(&serde_json::json!(0.25)));

        let back = serde_json::to_value(&info).unwrap();
        assert_eq!(back["total_time"], serde_json::json!(0.25));
    }
}
