//! Configuration management for `vcr-cleaner-core`.
//!
//! A cleaner is driven by one [`Policy`]: which request and response parts
//! to redact and which scrubbers to run. Policies are built once from a
//! partial [`PolicyOptions`] deep-merged over the defaults and never change
//! afterwards; a host shares one policy per session through an `Arc`.
//!
//! Policies can also be declared in YAML or JSON files ([`PolicyFile`]),
//! where scrubbers are expressed as regex replacement and form-field rules.
//!
//! License: MIT OR Apache-2.0

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::CleanerError;
use crate::exchange::FormFields;
use crate::headers::HeaderFilter;
use crate::scrubbers::{
    BodyScrubber, BodyScrubbers, FieldRule, FieldScrubber, FieldScrubbers, RegexScrubber, ScrubRule,
};

/// Maximum allowed length for a scrubber regex pattern.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Request-side options. Unset fields take their defaults when the policy
/// is built.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub ignore_hostname: Option<bool>,
    pub ignore_query_fields: Option<Vec<String>>,
    /// Header names to redact; `"*"` selects every header.
    pub ignore_headers: Option<Vec<String>>,
    pub body_scrubbers: Option<BodyScrubbers>,
    pub post_field_scrubbers: Option<FieldScrubbers>,
}

impl RequestOptions {
    pub fn ignore_hostname(mut self, ignore: bool) -> Self {
        self.ignore_hostname = Some(ignore);
        self
    }

    pub fn ignore_query_field(mut self, name: impl Into<String>) -> Self {
        self.ignore_query_fields.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn ignore_header(mut self, name: impl Into<String>) -> Self {
        self.ignore_headers.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn body_scrubber<F>(self, scrubber: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.body_scrubber_arc(Arc::new(scrubber))
    }

    pub fn body_scrubber_arc(mut self, scrubber: Arc<dyn BodyScrubber>) -> Self {
        self.body_scrubbers.get_or_insert_with(Vec::new).push(scrubber);
        self
    }

    pub fn post_field_scrubber<F>(self, scrubber: F) -> Self
    where
        F: Fn(FormFields) -> Result<FormFields> + Send + Sync + 'static,
    {
        self.post_field_scrubber_arc(Arc::new(scrubber))
    }

    pub fn post_field_scrubber_arc(mut self, scrubber: Arc<dyn FieldScrubber>) -> Self {
        self.post_field_scrubbers.get_or_insert_with(Vec::new).push(scrubber);
        self
    }
}

/// Response-side options.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    /// Header names to redact; `"*"` removes every header from the response.
    pub ignore_headers: Option<Vec<String>>,
    pub body_scrubbers: Option<BodyScrubbers>,
}

impl ResponseOptions {
    pub fn ignore_header(mut self, name: impl Into<String>) -> Self {
        self.ignore_headers.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn body_scrubber<F>(self, scrubber: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.body_scrubber_arc(Arc::new(scrubber))
    }

    pub fn body_scrubber_arc(mut self, scrubber: Arc<dyn BodyScrubber>) -> Self {
        self.body_scrubbers.get_or_insert_with(Vec::new).push(scrubber);
        self
    }
}

/// A partial policy, as supplied by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct PolicyOptions {
    pub request: RequestOptions,
    pub response: ResponseOptions,
}

impl PolicyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn response(mut self, response: ResponseOptions) -> Self {
        self.response = response;
        self
    }
}

/// Overlays `overlay` on `base`: every field set in `overlay` replaces the
/// corresponding field of `base`.
pub fn merge_options(base: PolicyOptions, overlay: PolicyOptions) -> PolicyOptions {
    debug!("merge_options: layering policy options");
    PolicyOptions {
        request: RequestOptions {
            ignore_hostname: overlay.request.ignore_hostname.or(base.request.ignore_hostname),
            ignore_query_fields: overlay.request.ignore_query_fields.or(base.request.ignore_query_fields),
            ignore_headers: overlay.request.ignore_headers.or(base.request.ignore_headers),
            body_scrubbers: overlay.request.body_scrubbers.or(base.request.body_scrubbers),
            post_field_scrubbers: overlay
                .request
                .post_field_scrubbers
                .or(base.request.post_field_scrubbers),
        },
        response: ResponseOptions {
            ignore_headers: overlay.response.ignore_headers.or(base.response.ignore_headers),
            body_scrubbers: overlay.response.body_scrubbers.or(base.response.body_scrubbers),
        },
    }
}

/// The active, immutable sanitization policy.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    request: RequestPolicy,
    response: ResponsePolicy,
}

#[derive(Debug, Clone, Default)]
struct RequestPolicy {
    ignore_hostname: bool,
    ignore_query_fields: BTreeSet<String>,
    ignore_headers: HeaderFilter,
    body_scrubbers: BodyScrubbers,
    post_field_scrubbers: FieldScrubbers,
}

#[derive(Debug, Clone, Default)]
struct ResponsePolicy {
    ignore_headers: HeaderFilter,
    body_scrubbers: BodyScrubbers,
}

impl Policy {
    /// Builds a policy from `options` deep-merged over the defaults (empty
    /// collections, `false` flags). Header wildcards are resolved here, once.
    pub fn configure(options: PolicyOptions) -> Self {
        let PolicyOptions { request, response } = options;

        let policy = Policy {
            request: RequestPolicy {
                ignore_hostname: request.ignore_hostname.unwrap_or(false),
                ignore_query_fields: request.ignore_query_fields.unwrap_or_default().into_iter().collect(),
                ignore_headers: HeaderFilter::from_directives(request.ignore_headers.unwrap_or_default()),
                body_scrubbers: request.body_scrubbers.unwrap_or_default(),
                post_field_scrubbers: request.post_field_scrubbers.unwrap_or_default(),
            },
            response: ResponsePolicy {
                ignore_headers: HeaderFilter::from_directives(response.ignore_headers.unwrap_or_default()),
                body_scrubbers: response.body_scrubbers.unwrap_or_default(),
            },
        };

        info!(
            "Configured cleaner policy: ignore_hostname={}, {} query field(s), request headers {}, response headers {}, {} request body scrubber(s), {} post field scrubber(s), {} response body scrubber(s).",
            policy.request.ignore_hostname,
            policy.request.ignore_query_fields.len(),
            describe_filter(&policy.request.ignore_headers),
            describe_filter(&policy.response.ignore_headers),
            policy.request.body_scrubbers.len(),
            policy.request.post_field_scrubbers.len(),
            policy.response.body_scrubbers.len(),
        );

        policy
    }

    pub fn ignore_hostname(&self) -> bool {
        self.request.ignore_hostname
    }

    pub fn ignored_query_fields(&self) -> &BTreeSet<String> {
        &self.request.ignore_query_fields
    }

    pub fn request_header_filter(&self) -> &HeaderFilter {
        &self.request.ignore_headers
    }

    pub fn ignores_all_request_headers(&self) -> bool {
        self.request.ignore_headers.is_all()
    }

    pub fn request_body_scrubbers(&self) -> &[Arc<dyn BodyScrubber>] {
        &self.request.body_scrubbers
    }

    pub fn post_field_scrubbers(&self) -> &[Arc<dyn FieldScrubber>] {
        &self.request.post_field_scrubbers
    }

    pub fn response_header_filter(&self) -> &HeaderFilter {
        &self.response.ignore_headers
    }

    pub fn ignores_all_response_headers(&self) -> bool {
        self.response.ignore_headers.is_all()
    }

    pub fn response_body_scrubbers(&self) -> &[Arc<dyn BodyScrubber>] {
        &self.response.body_scrubbers
    }
}

fn describe_filter(filter: &HeaderFilter) -> String {
    match filter {
        HeaderFilter::All => "all".to_string(),
        HeaderFilter::Named(names) => format!("{} named", names.len()),
    }
}

/// The request section of a policy file.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RequestSection {
    pub ignore_hostname: Option<bool>,
    pub ignore_query_fields: Option<Vec<String>>,
    pub ignore_headers: Option<Vec<String>>,
    pub body_scrubbers: Option<Vec<ScrubRule>>,
    pub post_field_scrubbers: Option<Vec<FieldRule>>,
}

/// The response section of a policy file.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ResponseSection {
    pub ignore_headers: Option<Vec<String>>,
    pub body_scrubbers: Option<Vec<ScrubRule>>,
}

/// Declarative policy, as read from a YAML or JSON file.
///
/// ```yaml
/// request:
///   ignoreHostname: true
///   ignoreQueryFields: [apiKey]
///   ignoreHeaders: [X-Api-Key]
///   bodyScrubbers:
///     - name: password
///       pattern: 'password=[^&]*'
///       replaceWith: 'password=[REDACTED]'
///   postFieldScrubbers:
///     - field: VerySecret
///       replaceWith: REDACTED
/// response:
///   ignoreHeaders: ['*']
/// ```
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyFile {
    pub request: RequestSection,
    pub response: ResponseSection,
}

impl PolicyFile {
    /// Loads and validates a policy file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading cleaner policy from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        let policy = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to parse policy file {}", path.display()))?;
        Ok(policy)
    }

    /// Parses and validates a policy document. JSON documents are accepted
    /// as well, being valid YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let policy: PolicyFile = serde_yml::from_str(text).context("Invalid policy document")?;
        policy.validate()?;
        Ok(policy)
    }

    /// Structural checks that do not need regex compilation.
    pub fn validate(&self) -> Result<(), CleanerError> {
        let mut errors = Vec::new();

        check_names("request.ignoreQueryFields", self.request.ignore_query_fields.as_deref(), &mut errors);
        check_names("request.ignoreHeaders", self.request.ignore_headers.as_deref(), &mut errors);
        check_names("response.ignoreHeaders", self.response.ignore_headers.as_deref(), &mut errors);
        check_rules("request.bodyScrubbers", self.request.body_scrubbers.as_deref(), &mut errors);
        check_rules("response.bodyScrubbers", self.response.body_scrubbers.as_deref(), &mut errors);

        for rule in self.request.post_field_scrubbers.iter().flatten() {
            if rule.field.trim().is_empty() {
                errors.push("request.postFieldScrubbers: a rule has an empty `field`.".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CleanerError::Configuration(format!(
                "Policy validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }

    /// Compiles the declarative scrubbers and produces the equivalent options.
    pub fn compile(&self) -> Result<PolicyOptions, CleanerError> {
        self.validate()?;

        let request = RequestOptions {
            ignore_hostname: self.request.ignore_hostname,
            ignore_query_fields: self.request.ignore_query_fields.clone(),
            ignore_headers: self.request.ignore_headers.clone(),
            body_scrubbers: compile_rules(self.request.body_scrubbers.as_deref())?,
            post_field_scrubbers: self.request.post_field_scrubbers.as_ref().map(|rules| {
                rules
                    .iter()
                    .map(|rule| Arc::new(rule.clone()) as Arc<dyn FieldScrubber>)
                    .collect()
            }),
        };

        let response = ResponseOptions {
            ignore_headers: self.response.ignore_headers.clone(),
            body_scrubbers: compile_rules(self.response.body_scrubbers.as_deref())?,
        };

        Ok(PolicyOptions { request, response })
    }
}

fn compile_rules(rules: Option<&[ScrubRule]>) -> Result<Option<BodyScrubbers>, CleanerError> {
    let Some(rules) = rules else {
        return Ok(None);
    };
    debug!("Compiling {} scrubber rule(s).", rules.len());
    let mut compiled: BodyScrubbers = Vec::with_capacity(rules.len());
    for rule in rules {
        compiled.push(Arc::new(RegexScrubber::compile(rule)?));
    }
    Ok(Some(compiled))
}

fn check_names(section: &str, names: Option<&[String]>, errors: &mut Vec<String>) {
    for name in names.unwrap_or_default() {
        if name.trim().is_empty() {
            errors.push(format!("{}: names must not be empty.", section));
        }
    }
}

fn check_rules(section: &str, rules: Option<&[ScrubRule]>, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for rule in rules.unwrap_or_default() {
        if rule.name.is_empty() {
            errors.push(format!("{}: a rule has an empty `name` field.", section));
        } else if !seen.insert(rule.name.as_str()) {
            errors.push(format!("{}: duplicate rule name found: '{}'.", section, rule.name));
        }
        if rule.pattern.is_empty() {
            errors.push(format!("{}: rule '{}' has an empty `pattern` field.", section, rule.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_never_configured() {
        let policy = Policy::default();
        assert!(!policy.ignore_hostname());
        assert!(policy.ignored_query_fields().is_empty());
        assert!(policy.request_header_filter().is_empty());
        assert!(!policy.ignores_all_response_headers());
        assert!(policy.request_body_scrubbers().is_empty());
        assert!(policy.post_field_scrubbers().is_empty());
        assert!(policy.response_body_scrubbers().is_empty());
    }

    #[test]
    fn test_configure_resolves_wildcards_once() {
        let policy = Policy::configure(PolicyOptions {
            request: RequestOptions::default().ignore_header("X-Api-Key").ignore_header("*"),
            response: ResponseOptions::default().ignore_header("X-Cache"),
        });
        assert!(policy.ignores_all_request_headers());
        assert_eq!(policy.request_header_filter(), &HeaderFilter::All);
        assert!(!policy.ignores_all_response_headers());
        assert_eq!(
            policy.response_header_filter(),
            &HeaderFilter::Named(vec!["X-Cache".to_string()])
        );
    }

    #[test]
    fn test_merge_options_overlay_wins_where_set() {
        let base = PolicyOptions::new().request(
            RequestOptions::default()
                .ignore_hostname(true)
                .ignore_query_field("apiKey"),
        );
        let overlay = PolicyOptions::new().request(RequestOptions::default().ignore_query_field("token"));

        let merged = merge_options(base, overlay);
        assert_eq!(merged.request.ignore_hostname, Some(true));
        assert_eq!(merged.request.ignore_query_fields, Some(vec!["token".to_string()]));
    }
}
