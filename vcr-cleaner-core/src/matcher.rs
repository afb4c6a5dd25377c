// vcr-cleaner-core/src/matcher.rs
//! Relaxed request matching.
//!
//! A host recorder decides whether a live request replays a recorded one by
//! running a set of named predicates and ANDing the results. The predicates
//! here apply the policy's exclusions to both sides before comparing, so a
//! recording whose secrets were scrubbed still matches the live request that
//! carries them.
//!
//! Every predicate is pure and symmetric. Anything that cannot be evaluated
//! (a URL that does not decompose, a scrubber that fails) counts as a
//! mismatch: a broken comparison must never turn into an accidental hit.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::config::Policy;
use crate::exchange::{FormFields, RequestHandle};
use crate::headers::headers_equal_ignoring;
use crate::scrubbers::{run_body_pipeline, run_field_pipeline};
use crate::url_codec::{decompose, retain_unignored, QueryMap, UrlParts};

/// The named predicates a host can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    Host,
    QueryString,
    Headers,
    Body,
    PostFields,
}

impl MatcherKind {
    pub const ALL: [MatcherKind; 5] = [
        MatcherKind::Host,
        MatcherKind::QueryString,
        MatcherKind::Headers,
        MatcherKind::Body,
        MatcherKind::PostFields,
    ];

    /// The name the predicate is registered under.
    pub fn name(self) -> &'static str {
        match self {
            MatcherKind::Host => "host",
            MatcherKind::QueryString => "query_string",
            MatcherKind::Headers => "headers",
            MatcherKind::Body => "body",
            MatcherKind::PostFields => "post_fields",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct RelaxedMatcher {
    policy: Arc<Policy>,
}

impl RelaxedMatcher {
    pub fn new(policy: Arc<Policy>) -> Self {
        RelaxedMatcher { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Always true when hostnames are ignored; otherwise the hosts must be
    /// identical.
    pub fn match_host<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        if self.policy.ignore_hostname() {
            return true;
        }
        match (parse(first), parse(second)) {
            (Some(a), Some(b)) => a.host == b.host,
            _ => false,
        }
    }

    /// Compares the decoded query strings after dropping ignored fields.
    /// Pair order does not matter.
    pub fn match_query_string<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        match (self.filtered_query(first), self.filtered_query(second)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Compares headers minus the ignored ones. When hostnames are ignored,
    /// the `Host` header is too, since a recording carries it blanked.
    pub fn match_headers<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        if self.policy.ignores_all_request_headers() {
            return true;
        }
        let filter = self.policy.request_header_filter();
        if self.policy.ignore_hostname() && !filter.selects("Host") {
            return headers_equal_ignoring(first.headers(), second.headers(), &filter.including("Host"));
        }
        headers_equal_ignoring(first.headers(), second.headers(), filter)
    }

    /// Runs each body through the request body scrubbers, then compares.
    pub fn match_body<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        let scrubbers = self.policy.request_body_scrubbers();
        let scrub = |body: Option<&str>| -> Option<Option<String>> {
            match body {
                None => Some(None),
                Some(body) => match run_body_pipeline(scrubbers, body) {
                    Ok(scrubbed) => Some(Some(scrubbed)),
                    Err(e) => {
                        warn!("matcher: body scrubber failed, treating as mismatch: {:#}", e);
                        None
                    }
                },
            }
        };
        match (scrub(first.body()), scrub(second.body())) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Runs each side's form fields through the post field scrubbers, then
    /// compares.
    pub fn match_post_fields<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        let scrubbers = self.policy.post_field_scrubbers();
        let scrub = |fields: Option<&FormFields>| match fields {
            None => Some(None),
            Some(fields) => match run_field_pipeline(scrubbers, fields.clone()) {
                Ok(scrubbed) => Some(Some(scrubbed)),
                Err(e) => {
                    warn!("matcher: post field scrubber failed, treating as mismatch: {:#}", e);
                    None
                }
            },
        };
        match (scrub(first.post_fields()), scrub(second.post_fields())) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Runs one named predicate.
    pub fn check<R: RequestHandle + ?Sized>(&self, kind: MatcherKind, first: &R, second: &R) -> bool {
        let matched = match kind {
            MatcherKind::Host => self.match_host(first, second),
            MatcherKind::QueryString => self.match_query_string(first, second),
            MatcherKind::Headers => self.match_headers(first, second),
            MatcherKind::Body => self.match_body(first, second),
            MatcherKind::PostFields => self.match_post_fields(first, second),
        };
        debug!("matcher: {} -> {}", kind, matched);
        matched
    }

    /// Every predicate's outcome, in [`MatcherKind::ALL`] order.
    pub fn report<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> Vec<(MatcherKind, bool)> {
        MatcherKind::ALL
            .iter()
            .map(|&kind| (kind, self.check(kind, first, second)))
            .collect()
    }

    /// True when every predicate matches.
    pub fn matches<R: RequestHandle + ?Sized>(&self, first: &R, second: &R) -> bool {
        MatcherKind::ALL
            .iter()
            .all(|&kind| self.check(kind, first, second))
    }

    fn filtered_query<R: RequestHandle + ?Sized>(&self, request: &R) -> Option<QueryMap> {
        let mut map = parse(request)?.query_map();
        retain_unignored(&mut map, self.policy.ignored_query_fields());
        Some(map)
    }
}

fn parse<R: RequestHandle + ?Sized>(request: &R) -> Option<UrlParts> {
    match decompose(request.url()) {
        Ok(parts) => Some(parts),
        Err(e) => {
            warn!("matcher: {}, treating as mismatch", e);
            None
        }
    }
}
