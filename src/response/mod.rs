//! Response normalization.
//!
//! [`ResponseNormalizer::normalize`] turns a [`RawResponse`] into an
//! [`Envelope`] according to [`ResponseOptions`] and records the original
//! response in a bounded cache, so status, headers and cookies stay
//! recoverable whichever shape the caller received.

pub mod cache;
pub mod envelope;
pub mod json_path;
pub mod wrapper;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use log::debug;
use serde_json::Value;
use url::Url;

use crate::core::RawResponse;

pub use cache::{DEFAULT_CACHE_CAPACITY, ResponseCache};
pub use envelope::{Envelope, JsonBody, METADATA_FIELD, ResponseId, STATUS_FIELD};
pub use wrapper::ResponseWrapper;

/// Shape selection flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOptions {
    /// Decode wrapper bodies eagerly.
    pub auto_json: bool,
    /// Prefer [`ResponseWrapper`] over the raw response.
    pub detailed_response: bool,
    /// Return decoded JSON for `application/json` responses.
    pub return_json: bool,
}

impl Default for ResponseOptions {
    fn default() -> Self {
        Self {
            auto_json: true,
            detailed_response: true,
            return_json: true,
        }
    }
}

#[derive(Debug)]
pub struct ResponseNormalizer {
    options: RwLock<ResponseOptions>,
    cache: ResponseCache,
    next_id: AtomicU64,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(ResponseOptions::default(), DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseNormalizer {
    pub fn new(options: ResponseOptions, cache_capacity: usize) -> Self {
        Self {
            options: RwLock::new(options),
            cache: ResponseCache::new(cache_capacity),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn options(&self) -> ResponseOptions {
        *self.options.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_options(&self, options: ResponseOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn normalize(&self, raw: RawResponse) -> Envelope {
        let options = self.options();
        let id = ResponseId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let raw = Arc::new(raw);
        self.cache.insert(id, raw.clone());

        if options.return_json && raw.is_json() {
            match serde_json::from_slice::<Value>(&raw.body) {
                Ok(decoded) => return Envelope::Json(JsonBody::inject(decoded, raw.status, id)),
                Err(err) => debug!("Failed to parse JSON response: {err}"),
            }
        }

        if options.detailed_response {
            Envelope::Wrapped(ResponseWrapper::new(raw, id, options.auto_json))
        } else {
            Envelope::Raw(raw)
        }
    }

    /// A missing response normalizes to a missing envelope.
    pub fn normalize_opt(&self, raw: Option<RawResponse>) -> Option<Envelope> {
        match raw {
            Some(raw) => Some(self.normalize(raw)),
            None => {
                debug!("Received no response, returning no envelope");
                None
            }
        }
    }

    /// Status code from the envelope's own fields, falling back to the cache.
    pub fn status_code(&self, envelope: &Envelope) -> Option<u16> {
        envelope.status_code().or_else(|| {
            envelope
                .id()
                .and_then(|id| self.cache.get(id))
                .map(|raw| raw.status)
        })
    }

    /// Status code for a decoded JSON value the caller kept on its own.
    pub fn status_code_of_value(&self, value: &Value) -> Option<u16> {
        envelope::status_from_fields(value).or_else(|| {
            envelope::id_from_fields(value)
                .and_then(|id| self.cache.get(id))
                .map(|raw| raw.status)
        })
    }

    pub fn original(&self, envelope: &Envelope) -> Option<Arc<RawResponse>> {
        match envelope {
            Envelope::Raw(raw) => Some(raw.clone()),
            Envelope::Wrapped(wrapper) => Some(wrapper.original().clone()),
            Envelope::Json(body) => self.cache.get(body.id()),
        }
    }

    pub fn headers(&self, envelope: &Envelope) -> Option<HeaderMap> {
        self.original(envelope).map(|raw| raw.headers.clone())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, envelope: &Envelope, name: &str) -> Option<String> {
        envelope.header(name).or_else(|| {
            self.original(envelope)
                .and_then(|raw| raw.header(name).map(str::to_string))
        })
    }

    pub fn cookies(&self, envelope: &Envelope) -> Option<HashMap<String, String>> {
        self.original(envelope).map(|raw| raw.cookies.clone())
    }

    pub fn cookie(&self, envelope: &Envelope, name: &str) -> Option<String> {
        self.original(envelope)
            .and_then(|raw| raw.cookies.get(name).cloned())
    }

    pub fn content_type(&self, envelope: &Envelope) -> Option<String> {
        self.header(envelope, http::header::CONTENT_TYPE.as_str())
    }

    pub fn text(&self, envelope: &Envelope) -> Option<String> {
        self.original(envelope).map(|raw| raw.text())
    }

    pub fn bytes(&self, envelope: &Envelope) -> Option<Bytes> {
        self.original(envelope).map(|raw| raw.body.clone())
    }

    pub fn elapsed(&self, envelope: &Envelope) -> Option<Duration> {
        self.original(envelope).map(|raw| raw.elapsed)
    }

    pub fn url(&self, envelope: &Envelope) -> Option<Url> {
        self.original(envelope).map(|raw| raw.url.clone())
    }

    /// Whole decoded body when `path` is `None`, otherwise the value at
    /// `path`; `default` on any failure.
    pub fn extract_json(&self, envelope: &Envelope, path: Option<&str>, default: Value) -> Value {
        let extracted = match path.filter(|p| !p.is_empty()) {
            Some(path) => envelope.json_value(path),
            None => envelope.json(),
        };
        extracted.unwrap_or(default)
    }

    /// True iff a status code is available and below 400.
    pub fn check_success(&self, envelope: &Envelope) -> bool {
        self.status_code(envelope).is_some_and(|status| status < 400)
    }

    /// True iff the envelope yields JSON.
    pub fn validate_response(&self, envelope: &Envelope) -> bool {
        envelope.json().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_response(status: u16, body: Value) -> RawResponse {
        RawResponse::new(status, Url::parse("https://api.example.com/users").unwrap())
            .with_json(&body)
            .with_cookie("sid", "abc")
            .with_elapsed(Duration::from_millis(40))
    }

    fn normalizer(return_json: bool, detailed_response: bool) -> ResponseNormalizer {
        ResponseNormalizer::new(
            ResponseOptions {
                auto_json: true,
                detailed_response,
                return_json,
            },
            DEFAULT_CACHE_CAPACITY,
        )
    }

    #[test]
    fn status_code_agrees_across_shapes() {
        let body = json!({"data": {"items": [{"id": 11}]}});
        let shapes = [
            normalizer(true, true).normalize(json_response(201, body.clone())),
            normalizer(false, true).normalize(json_response(201, body.clone())),
            normalizer(false, false).normalize(json_response(201, body.clone())),
        ];

        assert!(matches!(shapes[0], Envelope::Json(_)));
        assert!(matches!(shapes[1], Envelope::Wrapped(_)));
        assert!(matches!(shapes[2], Envelope::Raw(_)));
        let normalizer = ResponseNormalizer::default();
        for envelope in &shapes {
            assert_eq!(normalizer.status_code(envelope), Some(201));
            assert_eq!(
                normalizer.extract_json(envelope, Some("data.items.0.id"), Value::Null),
                json!(11)
            );
            assert_eq!(
                normalizer.extract_json(envelope, Some("data.items.3.id"), json!("none")),
                json!("none")
            );
        }
    }

    #[test]
    fn json_envelope_recovers_headers_and_cookies_from_cache() {
        let normalizer = ResponseNormalizer::default();
        let envelope = normalizer.normalize(json_response(200, json!({"ok": true})));

        assert_eq!(
            normalizer.content_type(&envelope).as_deref(),
            Some("application/json")
        );
        assert_eq!(normalizer.header(&envelope, "Content-Type").as_deref(), Some("application/json"));
        assert_eq!(normalizer.cookie(&envelope, "sid").as_deref(), Some("abc"));
        assert_eq!(normalizer.elapsed(&envelope), Some(Duration::from_millis(40)));
        assert_eq!(
            normalizer.url(&envelope).unwrap().as_str(),
            "https://api.example.com/users"
        );
        assert_eq!(normalizer.cache().len(), 1);
    }

    #[test]
    fn kept_value_resolves_status_through_identity_block() {
        let normalizer = ResponseNormalizer::default();
        let envelope = normalizer.normalize(json_response(202, json!({"queued": true})));
        let mut value = envelope.as_json().unwrap().value().clone();
        value.as_object_mut().unwrap().remove(STATUS_FIELD);
        value[METADATA_FIELD]
            .as_object_mut()
            .unwrap()
            .remove(STATUS_FIELD);

        assert_eq!(normalizer.status_code_of_value(&value), Some(202));
        assert_eq!(normalizer.status_code_of_value(&json!({"x": 1})), None);
    }

    #[test]
    fn undecodable_json_falls_back_to_wrapper() {
        let normalizer = ResponseNormalizer::default();
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        let raw = RawResponse::new(500, Url::parse("https://api.example.com").unwrap())
            .with_headers(headers)
            .with_body("not json");

        let envelope = normalizer.normalize(raw);
        assert!(matches!(envelope, Envelope::Wrapped(_)));
        assert_eq!(normalizer.status_code(&envelope), Some(500));
        assert!(!normalizer.check_success(&envelope));
        assert!(!normalizer.validate_response(&envelope));
        assert_eq!(normalizer.text(&envelope).as_deref(), Some("not json"));
    }

    #[test]
    fn missing_response_stays_missing() {
        let normalizer = ResponseNormalizer::default();
        assert!(normalizer.normalize_opt(None).is_none());
        assert!(normalizer.cache().is_empty());
    }

    #[test]
    fn options_are_mutable_at_runtime() {
        let normalizer = ResponseNormalizer::default();
        normalizer.set_options(ResponseOptions {
            auto_json: false,
            detailed_response: false,
            return_json: false,
        });
        let envelope = normalizer.normalize(json_response(200, json!({"ok": true})));
        assert!(envelope.as_raw().is_some());
        assert!(normalizer.validate_response(&envelope));
        assert!(normalizer.check_success(&envelope));
    }
}
