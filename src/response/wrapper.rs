//! Lazy-decoding view over a raw response.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use log::warn;
use once_cell::sync::OnceCell;
use serde_json::Value;
use url::Url;

use crate::core::RawResponse;

use super::envelope::ResponseId;
use super::json_path;

#[derive(Debug, Clone)]
pub struct ResponseWrapper {
    response: Arc<RawResponse>,
    id: ResponseId,
    json: OnceCell<Option<Value>>,
}

impl ResponseWrapper {
    /// With `auto_json` the body is decoded immediately, otherwise on first use.
    pub fn new(response: Arc<RawResponse>, id: ResponseId, auto_json: bool) -> Self {
        let wrapper = Self {
            response,
            id,
            json: OnceCell::new(),
        };
        if auto_json && !wrapper.response.body.is_empty() {
            let decoded = serde_json::from_slice(&wrapper.response.body).ok();
            let _ = wrapper.json.set(decoded);
        }
        wrapper
    }

    pub fn id(&self) -> ResponseId {
        self.id
    }

    pub fn status_code(&self) -> u16 {
        self.response.status
    }

    pub fn ok(&self) -> bool {
        self.response.ok()
    }

    pub fn content(&self) -> &Bytes {
        &self.response.body
    }

    pub fn text(&self) -> String {
        self.response.text()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    pub fn url(&self) -> &Url {
        &self.response.url
    }

    pub fn elapsed(&self) -> Duration {
        self.response.elapsed
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.response.cookies
    }

    /// Decoded body, memoised. `None` for empty or non-JSON bodies.
    pub fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| {
                if self.response.body.is_empty() {
                    return None;
                }
                match serde_json::from_slice(&self.response.body) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!("Response content is not valid JSON: {err}");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn get_json_value(&self, path: &str, default: Value) -> Value {
        match self.json() {
            Some(body) => json_path::extract(body, path, default),
            None => default,
        }
    }

    pub fn original(&self) -> &Arc<RawResponse> {
        &self.response
    }
}

impl fmt::Display for ResponseWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResponseWrapper(status={}, url={}, elapsed={}s)",
            self.response.status,
            self.response.url,
            self.response.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: &'static str) -> Arc<RawResponse> {
        Arc::new(
            RawResponse::new(200, Url::parse("https://api.example.com/items").unwrap())
                .with_body(body)
                .with_elapsed(Duration::from_millis(250)),
        )
    }

    #[test]
    fn decodes_lazily_and_memoises() {
        let wrapper = ResponseWrapper::new(raw(r#"{"items":[{"id":3}]}"#), ResponseId(1), false);
        assert_eq!(wrapper.get_json_value("items.0.id", Value::Null), json!(3));
        assert!(std::ptr::eq(wrapper.json().unwrap(), wrapper.json().unwrap()));
    }

    #[test]
    fn non_json_body_yields_default() {
        let wrapper = ResponseWrapper::new(raw("<html/>"), ResponseId(1), true);
        assert!(wrapper.json().is_none());
        assert_eq!(wrapper.get_json_value("a", json!(0)), json!(0));
        assert_eq!(wrapper.text(), "<html/>");
    }

    #[test]
    fn display_summarises_response() {
        let wrapper = ResponseWrapper::new(raw(""), ResponseId(9), true);
        assert_eq!(
            wrapper.to_string(),
            "ResponseWrapper(status=200, url=https://api.example.com/items, elapsed=0.25s)"
        );
        assert!(wrapper.ok());
    }
}
