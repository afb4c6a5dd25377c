// vcr-cleaner-core/src/scrubbers.rs
//! Scrubbers: user-supplied transforms applied to bodies and form fields.
//!
//! Scrubbers run in order, the output of one feeding the next. They are
//! applied both when an exchange is recorded and when a live request is
//! compared against a recording, so they must be pure and deterministic:
//! the same input must always produce the same output.
//!
//! Any closure `Fn(&str) -> anyhow::Result<String>` is a [`BodyScrubber`]
//! and any closure `Fn(FormFields) -> anyhow::Result<FormFields>` is a
//! [`FieldScrubber`]. Policy files use the declarative [`RegexScrubber`] and
//! [`FieldRule`] instead.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use log::debug;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PATTERN_LENGTH;
use crate::errors::CleanerError;
use crate::exchange::FormFields;

/// A string-to-string transform over a raw body.
pub trait BodyScrubber: Send + Sync {
    fn scrub(&self, body: &str) -> Result<String>;

    fn name(&self) -> &str {
        "closure"
    }
}

impl<F> BodyScrubber for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn scrub(&self, body: &str) -> Result<String> {
        self(body)
    }
}

impl fmt::Debug for dyn BodyScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyScrubber({})", self.name())
    }
}

/// A map-to-map transform over decoded form fields.
pub trait FieldScrubber: Send + Sync {
    fn scrub(&self, fields: FormFields) -> Result<FormFields>;

    fn name(&self) -> &str {
        "closure"
    }
}

impl<F> FieldScrubber for F
where
    F: Fn(FormFields) -> Result<FormFields> + Send + Sync,
{
    fn scrub(&self, fields: FormFields) -> Result<FormFields> {
        self(fields)
    }
}

impl fmt::Debug for dyn FieldScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldScrubber({})", self.name())
    }
}

pub type BodyScrubbers = Vec<Arc<dyn BodyScrubber>>;
pub type FieldScrubbers = Vec<Arc<dyn FieldScrubber>>;

/// Runs `body` through every scrubber in order.
pub fn run_body_pipeline(scrubbers: &[Arc<dyn BodyScrubber>], body: &str) -> Result<String> {
    let mut current = body.to_string();
    for scrubber in scrubbers {
        current = scrubber.scrub(&current)?;
        debug!("scrubbers: applied body scrubber '{}'", scrubber.name());
    }
    Ok(current)
}

/// Runs `fields` through every scrubber in order.
pub fn run_field_pipeline(scrubbers: &[Arc<dyn FieldScrubber>], fields: FormFields) -> Result<FormFields> {
    let mut current = fields;
    for scrubber in scrubbers {
        current = scrubber.scrub(current)?;
        debug!("scrubbers: applied field scrubber '{}'", scrubber.name());
    }
    Ok(current)
}

/// Declarative regex replacement rule, as written in a policy file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ScrubRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pattern: String,
    /// Replacement text; `$1`-style capture references are expanded.
    #[serde(default)]
    pub replace_with: String,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub dot_matches_new_line: bool,
}

/// A compiled [`ScrubRule`].
#[derive(Debug)]
pub struct RegexScrubber {
    name: String,
    regex: Regex,
    replace_with: String,
}

impl RegexScrubber {
    pub fn compile(rule: &ScrubRule) -> Result<Self, CleanerError> {
        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            return Err(CleanerError::PatternLengthExceeded(
                rule.name.clone(),
                rule.pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
        }

        let regex = RegexBuilder::new(&rule.pattern)
            .multi_line(rule.multiline)
            .dot_matches_new_line(rule.dot_matches_new_line)
            .size_limit(10 * (1 << 20))
            .build()
            .map_err(|e| CleanerError::InvalidScrubberPattern(rule.name.clone(), e))?;

        debug!("scrubbers: rule '{}' compiled successfully", rule.name);
        Ok(RegexScrubber {
            name: rule.name.clone(),
            regex,
            replace_with: rule.replace_with.clone(),
        })
    }
}

impl BodyScrubber for RegexScrubber {
    fn scrub(&self, body: &str) -> Result<String> {
        Ok(self.regex.replace_all(body, self.replace_with.as_str()).into_owned())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Declarative form-field rule: replaces the named field's value, or
/// removes the field when no replacement is given. Absent fields are left
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FieldRule {
    pub field: String,
    #[serde(default)]
    pub replace_with: Option<String>,
}

impl FieldScrubber for FieldRule {
    fn scrub(&self, mut fields: FormFields) -> Result<FormFields> {
        match &self.replace_with {
            Some(replacement) => {
                if let Some(value) = fields.get_mut(&self.field) {
                    *value = replacement.clone();
                }
            }
            None => {
                fields.remove(&self.field);
            }
        }
        Ok(fields)
    }

    fn name(&self) -> &str {
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str, replace_with: &str) -> ScrubRule {
        ScrubRule {
            name: name.to_string(),
            description: None,
            pattern: pattern.to_string(),
            replace_with: replace_with.to_string(),
            multiline: false,
            dot_matches_new_line: false,
        }
    }

    #[test]
    fn test_closure_pipeline_runs_in_order() -> Result<()> {
        let mut scrubbers: BodyScrubbers = Vec::new();
        scrubbers.push(Arc::new(|body: &str| -> Result<String> { Ok(body.replace("SuperSecret", "X")) }));
        scrubbers.push(Arc::new(|body: &str| -> Result<String> { Ok(body.replace('X', "[GONE]")) }));
        let out = run_body_pipeline(&scrubbers, "This is not secret, but this is SuperSecret")?;
        assert_eq!(out, "This is not secret, but this is [GONE]");
        Ok(())
    }

    #[test]
    fn test_pipeline_propagates_errors() {
        let failing: Arc<dyn BodyScrubber> = Arc::new(|_: &str| -> Result<String> {
            anyhow::bail!("scrubber exploded")
        });
        let scrubbers: BodyScrubbers = vec![failing];
        let err = run_body_pipeline(&scrubbers, "body").unwrap_err();
        assert_eq!(err.to_string(), "scrubber exploded");
    }

    #[test]
    fn test_regex_scrubber_expands_captures() -> Result<()> {
        let scrubber = RegexScrubber::compile(&rule("token", r#""token":\s*"([a-z]+)-\w+""#, r#""token":"$1-[REDACTED]""#))?;
        let out = scrubber.scrub(r#"{"token": "live-abc123"}"#)?;
        assert_eq!(out, r#"{"token":"live-[REDACTED]"}"#);
        Ok(())
    }

    #[test]
    fn test_regex_scrubber_rejects_bad_patterns() {
        let err = RegexScrubber::compile(&rule("broken", "(unclosed", "")).unwrap_err();
        assert!(matches!(err, CleanerError::InvalidScrubberPattern(name, _) if name == "broken"));

        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let err = RegexScrubber::compile(&rule("long", &long, "")).unwrap_err();
        assert!(matches!(err, CleanerError::PatternLengthExceeded(_, _, MAX_PATTERN_LENGTH)));
    }

    #[test]
    fn test_field_rule_replaces_or_removes() -> Result<()> {
        let mut fields = FormFields::new();
        fields.insert("SomethingPublic".to_string(), "Not a secret".to_string());
        fields.insert("VerySecret".to_string(), "Do not tell anyone this secret".to_string());

        let replaced = FieldRule { field: "VerySecret".to_string(), replace_with: Some("REDACTED".to_string()) }
            .scrub(fields.clone())?;
        assert_eq!(replaced.get("VerySecret").map(String::as_str), Some("REDACTED"));

        let removed = FieldRule { field: "VerySecret".to_string(), replace_with: None }.scrub(fields)?;
        assert!(!removed.contains_key("VerySecret"));
        assert_eq!(removed.len(), 1);

        let untouched = FieldRule { field: "Missing".to_string(), replace_with: Some("x".to_string()) }
            .scrub(removed.clone())?;
        assert_eq!(untouched, removed);
        Ok(())
    }
}
