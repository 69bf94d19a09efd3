//! The normalized result of a call.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::core::RawResponse;

use super::json_path;
use super::wrapper::ResponseWrapper;

pub const STATUS_FIELD: &str = "status_code";
pub const METADATA_FIELD: &str = "__response_metadata";

/// Opaque handle issued at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResponseId(pub(crate) u64);

impl ResponseId {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(Self)
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded JSON body with the status code and identity block injected.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody {
    value: Value,
    id: ResponseId,
}

impl JsonBody {
    /// Objects get the extra fields in place; any other value is nested
    /// under `data`.
    pub(crate) fn inject(decoded: Value, status: u16, id: ResponseId) -> Self {
        let mut object = match decoded {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        object.insert(STATUS_FIELD.to_string(), json!(status));
        object.insert(
            METADATA_FIELD.to_string(),
            json!({"id": id.value(), "status_code": status}),
        );
        Self {
            value: Value::Object(object),
            id,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn id(&self) -> ResponseId {
        self.id
    }

    /// Status from the `status_code` field, then the identity block.
    pub fn status_code(&self) -> Option<u16> {
        status_from_fields(&self.value)
    }
}

pub(crate) fn status_from_fields(value: &Value) -> Option<u16> {
    let as_status = |v: &Value| v.as_u64().and_then(|code| u16::try_from(code).ok());
    value
        .get(STATUS_FIELD)
        .and_then(as_status)
        .or_else(|| {
            value
                .get(METADATA_FIELD)
                .and_then(|meta| meta.get(STATUS_FIELD))
                .and_then(as_status)
        })
}

pub(crate) fn id_from_fields(value: &Value) -> Option<ResponseId> {
    value
        .get(METADATA_FIELD)
        .and_then(|meta| meta.get("id"))
        .and_then(ResponseId::from_value)
}

/// One of the three shapes a normalized response can take.
#[derive(Debug, Clone)]
pub enum Envelope {
    Json(JsonBody),
    Wrapped(ResponseWrapper),
    Raw(Arc<RawResponse>),
}

impl Envelope {
    pub fn id(&self) -> Option<ResponseId> {
        match self {
            Self::Json(body) => Some(body.id()),
            Self::Wrapped(wrapper) => Some(wrapper.id()),
            Self::Raw(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Json(body) => body.status_code(),
            Self::Wrapped(wrapper) => Some(wrapper.status_code()),
            Self::Raw(raw) => Some(raw.status),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code().is_some_and(|status| status < 400)
    }

    /// Decoded body; `None` when the body is not JSON.
    pub fn json(&self) -> Option<Value> {
        match self {
            Self::Json(body) => Some(body.value().clone()),
            Self::Wrapped(wrapper) => wrapper.json().cloned(),
            Self::Raw(raw) if !raw.body.is_empty() => serde_json::from_slice(&raw.body).ok(),
            Self::Raw(_) => None,
        }
    }

    pub fn json_value(&self, path: &str) -> Option<Value> {
        match self {
            Self::Json(body) => json_path::lookup(body.value(), path).cloned(),
            Self::Wrapped(wrapper) => wrapper
                .json()
                .and_then(|body| json_path::lookup(body, path))
                .cloned(),
            Self::Raw(_) => self
                .json()
                .and_then(|body| json_path::lookup(&body, path).cloned()),
        }
    }

    /// Header carried by the envelope itself; JSON envelopes need the
    /// normalizer's cache, see [`ResponseNormalizer::header`](super::ResponseNormalizer::header).
    pub fn header(&self, name: &str) -> Option<String> {
        match self {
            Self::Json(_) => None,
            Self::Wrapped(wrapper) => wrapper.header(name).map(str::to_string),
            Self::Raw(raw) => raw.header(name).map(str::to_string),
        }
    }

    pub fn as_json(&self) -> Option<&JsonBody> {
        match self {
            Self::Json(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_wrapper(&self) -> Option<&ResponseWrapper> {
        match self {
            Self::Wrapped(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Arc<RawResponse>> {
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_bodies_get_status_and_metadata() {
        let body = JsonBody::inject(json!({"name": "Ada"}), 201, ResponseId(4));
        assert_eq!(
            body.value(),
            &json!({
                "name": "Ada",
                "status_code": 201,
                "__response_metadata": {"id": 4, "status_code": 201}
            })
        );
        assert_eq!(body.status_code(), Some(201));
    }

    #[test]
    fn non_object_bodies_are_nested_under_data() {
        let body = JsonBody::inject(json!([1, 2]), 200, ResponseId(5));
        assert_eq!(body.value()["data"], json!([1, 2]));
        assert_eq!(id_from_fields(body.value()), Some(ResponseId(5)));

        let scalar = JsonBody::inject(json!("pong"), 200, ResponseId(6));
        assert_eq!(scalar.value()["data"], json!("pong"));
    }

    #[test]
    fn status_falls_back_to_metadata_block() {
        let value = json!({"__response_metadata": {"id": 1, "status_code": 404}});
        assert_eq!(status_from_fields(&value), Some(404));
        assert_eq!(status_from_fields(&json!({"x": 1})), None);
    }
}
