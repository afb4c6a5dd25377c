// vcr-cleaner-core/src/sanitizer.rs
//! The pre-record hook: rewrites a request/response pair into the form that
//! is safe to persist.
//!
//! Every step works on detached copies. The request and response handed in
//! are only written once the whole exchange has been sanitized, so a failing
//! scrubber leaves them untouched and the host never sees a half-redacted
//! exchange.
//!
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use log::{debug, info};

use crate::config::Policy;
use crate::diagnostics::{
    header_value, with_header_value, RawHeaderBlock, RawLine, TransportInfo, BLANK_HEADER_VALUE,
};
use crate::errors::CleanerError;
use crate::exchange::{FormFields, Headers, RequestHandle, ResponseHandle, ResponseParts};
use crate::headers::redact_headers;
use crate::redaction_log::log_host_redaction_debug;
use crate::scrubbers::{run_body_pipeline, run_field_pipeline};
use crate::url_codec::{decompose, rebuild, remove_fields_from_target, REDACTED_HOST};

#[derive(Debug, Clone)]
pub struct Sanitizer {
    policy: Arc<Policy>,
}

/// The sanitized request fields, not yet written back.
struct SanitizedRequest {
    url: String,
    headers: Headers,
    body: Option<String>,
    post_fields: Option<FormFields>,
}

impl Sanitizer {
    pub fn new(policy: Arc<Policy>) -> Self {
        Sanitizer { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Sanitizes `request` and `response` in place, right before they are
    /// recorded.
    ///
    /// Fails with [`CleanerError::MalformedUrl`] when a URL that needs
    /// rewriting cannot be decomposed and with [`CleanerError::Scrubber`]
    /// when a scrubber fails. On failure neither argument is modified.
    pub fn on_before_record<R, S>(&self, request: &mut R, response: &mut S) -> Result<(), CleanerError>
    where
        R: RequestHandle + ?Sized,
        S: ResponseHandle + ?Sized,
    {
        let sanitized_request = self.sanitize_request(request)?;

        let mut working = response.to_parts();
        self.sanitize_response(&mut working)?;

        request.set_url(sanitized_request.url);
        *request.headers_mut() = sanitized_request.headers;
        request.set_body(sanitized_request.body);
        request.set_post_fields(sanitized_request.post_fields);
        response.apply_parts(working);

        info!("Sanitized exchange before record.");
        Ok(())
    }

    fn sanitize_request<R: RequestHandle + ?Sized>(&self, request: &R) -> Result<SanitizedRequest, CleanerError> {
        let mut headers = request.headers().clone();
        let url = self.sanitize_url(request.url(), Some(&mut headers))?;

        redact_headers(&mut headers, self.policy.request_header_filter());

        let body = request
            .body()
            .map(|body| run_body_pipeline(self.policy.request_body_scrubbers(), body))
            .transpose()
            .map_err(|e| CleanerError::scrubber("request body", e))?;

        let post_fields = request
            .post_fields()
            .cloned()
            .map(|fields| run_field_pipeline(self.policy.post_field_scrubbers(), fields))
            .transpose()
            .map_err(|e| CleanerError::scrubber("request post fields", e))?;

        Ok(SanitizedRequest {
            url,
            headers,
            body,
            post_fields,
        })
    }

    /// Applies host redaction and query field removal to `url`. When
    /// `headers` is given and the host is redacted, its `Host` header is
    /// blanked as well.
    fn sanitize_url(&self, url: &str, headers: Option<&mut Headers>) -> Result<String, CleanerError> {
        let redact_host = self.policy.ignore_hostname();
        let strip_fields = !self.policy.ignored_query_fields().is_empty();
        if !redact_host && !strip_fields {
            return Ok(url.to_string());
        }

        let mut parts = decompose(url)?;

        if redact_host {
            if let Some(host) = &parts.host {
                log_host_redaction_debug("sanitizer", host, REDACTED_HOST);
            }
            parts = parts.with_host(REDACTED_HOST);
            if let Some(headers) = headers {
                if headers.contains("Host") {
                    headers.set("Host", "");
                }
            }
        }

        if strip_fields {
            parts = parts.without_query_fields(self.policy.ignored_query_fields());
        }

        Ok(rebuild(&parts))
    }

    fn sanitize_response(&self, parts: &mut ResponseParts) -> Result<(), CleanerError> {
        if self.policy.ignores_all_response_headers() {
            debug!("sanitizer: dropping all {} response header(s)", parts.headers.len());
            parts.headers.clear();
        } else {
            redact_headers(&mut parts.headers, self.policy.response_header_filter());
        }

        if let Some(body) = &parts.body {
            let scrubbed = run_body_pipeline(self.policy.response_body_scrubbers(), body)
                .map_err(|e| CleanerError::scrubber("response body", e))?;
            parts.body = Some(scrubbed);
        }

        if let Some(info) = parts.transport_info.take() {
            parts.transport_info = Some(self.sanitize_transport_info(info)?);
        }

        Ok(())
    }

    fn sanitize_transport_info(&self, mut info: TransportInfo) -> Result<TransportInfo, CleanerError> {
        if let Some(url) = &info.url {
            info.url = Some(self.sanitize_url(url, None)?);
        }

        if self.policy.ignore_hostname() && info.primary_ip.is_some() {
            info.primary_ip = Some(String::new());
        }

        if let Some(raw) = &info.request_header {
            info.request_header = Some(self.sanitize_raw_headers(raw));
        }

        Ok(info)
    }

    fn sanitize_raw_headers(&self, raw: &str) -> String {
        let filter = self.policy.request_header_filter();
        let mut block = RawHeaderBlock::parse(raw);

        for line in block.lines.iter_mut() {
            match line {
                RawLine::Request { target, .. } => {
                    *target = self.sanitize_request_target(target);
                }
                RawLine::Header { name, rest } => {
                    if filter.selects(name) {
                        *rest = with_header_value(rest, BLANK_HEADER_VALUE);
                    } else if self.policy.ignore_hostname() && name.eq_ignore_ascii_case("Host") {
                        let redacted = redact_authority_host(header_value(rest));
                        *rest = with_header_value(rest, &redacted);
                    }
                }
                RawLine::Other(_) => {}
            }
        }

        block.to_string()
    }

    /// Origin-form targets (`/path?query`) only lose ignored query fields.
    /// Absolute-form targets (`http://host/path?query`) are sanitized like
    /// any other URL.
    fn sanitize_request_target(&self, target: &str) -> String {
        if target.contains("://") {
            if let Ok(url) = self.sanitize_url(target, None) {
                return url;
            }
        }
        remove_fields_from_target(target, self.policy.ignored_query_fields())
    }
}

/// Replaces the host of a `host[:port]` authority with the redaction
/// literal, keeping the port.
fn redact_authority_host(authority: &str) -> String {
    match decompose(&format!("//{}", authority)) {
        Ok(parts) => rebuild(&parts.with_host(REDACTED_HOST))
            .trim_start_matches("//")
            .to_string(),
        Err(_) => REDACTED_HOST.to_string(),
    }
}
