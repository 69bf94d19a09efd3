//! Core data structures shared by sessions, the dispatcher and the response
//! normalizer.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::Method;
use serde_json::Value;
use url::Url;

/// Untouched response as returned by the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub body: Bytes,
    pub url: Url,
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn new(status: u16, url: Url) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            body: Bytes::new(),
            url,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and marks the response as JSON.
    pub fn with_json(mut self, value: &Value) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Bytes::from(value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|value| value.to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// True when the status code is below 400.
    pub fn ok(&self) -> bool {
        self.status < 400
    }
}

/// Request payload forwarded to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Text(String),
    Bytes(Bytes),
}

/// Fully resolved request handed to a [`Transport`](super::Transport) or
/// [`Connection`](super::Connection).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

/// Basic credentials attached to a session.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Transport options bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub verify: bool,
    pub auth: Option<BasicAuth>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            proxy: None,
            verify: true,
            auth: None,
        }
    }
}

impl SessionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Everything a transport needs to issue a session binding.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub alias: String,
    pub base_url: String,
    pub headers: HeaderMap,
    pub options: SessionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_helper_sets_content_type() {
        let response = RawResponse::new(200, Url::parse("https://example.com").unwrap())
            .with_json(&json!({"ok": true}));
        assert!(response.is_json());
        assert_eq!(response.text(), r#"{"ok":true}"#);
    }

    #[test]
    fn basic_auth_debug_hides_password() {
        let auth = BasicAuth::new("qa", "hunter2");
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("qa"));
        assert!(!rendered.contains("hunter2"));
    }
}
