// vcr-cleaner-core/src/cleaner.rs
//! Wiring into a host recorder.
//!
//! [`VcrCleaner::enable`] freezes a [`Policy`] and builds the matcher and
//! sanitizer that share it. [`VcrCleaner::register`] then hands the host
//! five named request matchers and one pre-record hook. Nothing here is
//! global: two cleaners with different policies can serve two recorders in
//! the same process.
//!
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use log::info;

use crate::config::{Policy, PolicyOptions};
use crate::errors::CleanerError;
use crate::exchange::{RequestHandle, ResponseHandle};
use crate::matcher::{MatcherKind, RelaxedMatcher};
use crate::sanitizer::Sanitizer;

/// A named request predicate, as a host stores it.
pub type RequestMatcherFn<R> = Box<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// The hook a host runs right before persisting an exchange.
pub type BeforeRecordHook<R, S> = Box<dyn Fn(&mut R, &mut S) -> Result<(), CleanerError> + Send + Sync>;

/// The registration surface a recording/replay library exposes.
pub trait RecorderHost {
    type Request: RequestHandle + 'static;
    type Response: ResponseHandle + 'static;

    /// Registers (or replaces) the request matcher called `name`.
    fn add_request_matcher(&mut self, name: &str, matcher: RequestMatcherFn<Self::Request>);

    fn add_before_record_hook(&mut self, hook: BeforeRecordHook<Self::Request, Self::Response>);
}

#[derive(Debug, Clone)]
pub struct VcrCleaner {
    policy: Arc<Policy>,
    matcher: RelaxedMatcher,
    sanitizer: Sanitizer,
}

impl VcrCleaner {
    /// Freezes `options` into a policy. A later call builds an independent
    /// cleaner; it never alters this one.
    pub fn enable(options: PolicyOptions) -> Self {
        let policy = Arc::new(Policy::configure(options));
        VcrCleaner {
            matcher: RelaxedMatcher::new(Arc::clone(&policy)),
            sanitizer: Sanitizer::new(Arc::clone(&policy)),
            policy,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn matcher(&self) -> &RelaxedMatcher {
        &self.matcher
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Registers every [`MatcherKind`] under its name, plus the sanitizer as
    /// a pre-record hook.
    pub fn register<H: RecorderHost>(&self, host: &mut H) {
        for kind in MatcherKind::ALL {
            let matcher = self.matcher.clone();
            host.add_request_matcher(
                kind.name(),
                Box::new(move |first: &H::Request, second: &H::Request| matcher.check(kind, first, second)),
            );
        }

        let sanitizer = self.sanitizer.clone();
        host.add_before_record_hook(Box::new(move |request: &mut H::Request, response: &mut H::Response| {
            sanitizer.on_before_record(request, response)
        }));

        info!("Registered {} request matchers and the pre-record hook.", MatcherKind::ALL.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestOptions;
    use crate::exchange::{Request, Response};

    #[derive(Default)]
    struct Recorder {
        matchers: Vec<(String, RequestMatcherFn<Request>)>,
        hooks: Vec<BeforeRecordHook<Request, Response>>,
    }

    impl RecorderHost for Recorder {
        type Request = Request;
        type Response = Response;

        fn add_request_matcher(&mut self, name: &str, matcher: RequestMatcherFn<Request>) {
            self.matchers.retain(|(existing, _)| existing != name);
            self.matchers.push((name.to_string(), matcher));
        }

        fn add_before_record_hook(&mut self, hook: BeforeRecordHook<Request, Response>) {
            self.hooks.push(hook);
        }
    }

    #[test]
    fn test_register_installs_named_matchers_and_hook() {
        let cleaner = VcrCleaner::enable(PolicyOptions::new().request(RequestOptions::default().ignore_hostname(true)));
        let mut recorder = Recorder::default();
        cleaner.register(&mut recorder);

        let names: Vec<&str> = recorder.matchers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["host", "query_string", "headers", "body", "post_fields"]);
        assert_eq!(recorder.hooks.len(), 1);

        let (_, host) = &recorder.matchers[0];
        assert!(host(
            &Request::new("GET", "http://a.example/"),
            &Request::new("GET", "http://b.example/")
        ));
    }

    #[test]
    fn test_enable_twice_keeps_policies_independent() {
        let first = VcrCleaner::enable(PolicyOptions::new().request(RequestOptions::default().ignore_hostname(true)));
        let second = VcrCleaner::enable(PolicyOptions::new());
        assert!(first.policy().ignore_hostname());
        assert!(!second.policy().ignore_hostname());
    }
}
