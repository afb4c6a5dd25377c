// vcr-cleaner-core/src/exchange.rs
//! Request/response snapshots and the accessor contract the engine uses to
//! read and rewrite them.
//!
//! A host recorder can either hand the engine the concrete [`Request`] and
//! [`Response`] types defined here, or implement [`RequestHandle`] and
//! [`ResponseHandle`] for its own types.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::diagnostics::TransportInfo;

/// Decoded form fields of a request body.
pub type FormFields = BTreeMap<String, String>;

/// An insertion-ordered header list.
///
/// Lookups compare names case-insensitively; stored names keep the casing
/// they were inserted with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first header named `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replaces the value of every header named `name` (ignoring case),
    /// or appends a new entry when none exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut found = false;
        for (key, existing) in self.entries.iter_mut() {
            if key.eq_ignore_ascii_case(name) {
                *existing = value.clone();
                found = true;
            }
        }
        if !found {
            self.entries.push((name.to_string(), value));
        }
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        self.entries.retain(|(key, value)| keep(key, value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = (&str, &mut String)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = Headers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                // A null value is recorded by some hosts for blanked headers.
                while let Some((key, value)) = access.next_entry::<String, Option<String>>()? {
                    entries.push((key, value.unwrap_or_default()));
                }
                Ok(Headers { entries })
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}

/// Accessor contract for a request the engine reads or rewrites.
pub trait RequestHandle {
    fn url(&self) -> &str;
    fn set_url(&mut self, url: String);
    fn headers(&self) -> &Headers;
    fn headers_mut(&mut self) -> &mut Headers;
    fn body(&self) -> Option<&str>;
    fn set_body(&mut self, body: Option<String>);
    fn post_fields(&self) -> Option<&FormFields>;
    fn set_post_fields(&mut self, fields: Option<FormFields>);

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers_mut().set(name, value);
    }
}

/// The exported, structured form of a response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseParts {
    pub status: ResponseStatus,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_info: Option<TransportInfo>,
}

/// Accessor contract for a recorded response.
///
/// Responses are treated as values: the engine exports them with
/// [`ResponseHandle::to_parts`], sanitizes the detached copy, and hands it
/// back through [`ResponseHandle::apply_parts`].
pub trait ResponseHandle {
    fn to_parts(&self) -> ResponseParts;

    /// Adopts the sanitized headers, body and transport info from `parts`.
    /// Implementations must leave every other field untouched.
    fn apply_parts(&mut self, parts: ResponseParts);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for ResponseStatus {
    fn default() -> Self {
        ResponseStatus {
            code: 200,
            message: None,
        }
    }
}

/// A recorded HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_fields: Option<FormFields>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
            post_fields: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_post_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post_fields
            .get_or_insert_with(FormFields::new)
            .insert(name.into(), value.into());
        self
    }
}

impl RequestHandle for Request {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn set_body(&mut self, body: Option<String>) {
        self.body = body;
    }

    fn post_fields(&self) -> Option<&FormFields> {
        self.post_fields.as_ref()
    }

    fn set_post_fields(&mut self, fields: Option<FormFields>) {
        self.post_fields = fields;
    }
}

/// A recorded HTTP response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_info: Option<TransportInfo>,
}

impl Response {
    pub fn new(code: u16) -> Self {
        Response {
            status: ResponseStatus { code, message: None },
            ..Response::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_transport_info(mut self, info: TransportInfo) -> Self {
        self.transport_info = Some(info);
        self
    }
}

impl ResponseHandle for Response {
    fn to_parts(&self) -> ResponseParts {
        ResponseParts {
            status: self.status.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            transport_info: self.transport_info.clone(),
        }
    }

    fn apply_parts(&mut self, parts: ResponseParts) {
        self.headers = parts.headers;
        self.body = parts.body;
        self.transport_info = parts.transport_info;
    }
}

/// One request/response pair as it is about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
}
