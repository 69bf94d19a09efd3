//! Splits a loosely-typed call into control and transport parameters.
//!
//! Control parameters (retries, delay, token policy, expected status) steer
//! the dispatcher and never reach the wire. Everything else becomes
//! [`TransportParams`]. Rust callers can build a [`RequestSpec`] directly; the
//! [`ParamBag`] path serves keyword facades and batch entries.

pub mod values;

use std::fmt;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::core::RequestBody;

/// Open-ended keyword arguments of one call.
pub type ParamBag = serde_json::Map<String, Value>;

const METHOD_KEYS: &[&str] = &["method", "Method", "METHOD"];
const ALIAS_KEYS: &[&str] = &["alias", "Alias", "ALIAS"];
const ENDPOINT_KEYS: &[&str] = &["endpoint", "Endpoint", "ENDPOINT"];
const URL_KEYS: &[&str] = &["url", "Url", "URL", "uri", "Uri", "URI"];
const TOKEN_KEYS: &[&str] = &[
    "token",
    "Token",
    "TOKEN",
    "auth_token",
    "access_token",
    "bearerToken",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("invalid header {0}")]
    InvalidHeader(String),
}

/// Status code, or set of codes, that counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedStatus {
    Single(u16),
    AnyOf(Vec<u16>),
}

impl ExpectedStatus {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Single(expected) => *expected == status,
            Self::AnyOf(expected) => expected.contains(&status),
        }
    }

    /// Accepts an integer, a comma-separated string or a list.
    ///
    /// Unparseable input is logged and yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(_) => match status_code(value) {
                Some(code) => Some(Self::Single(code)),
                None => {
                    warn!("Could not convert expected_status '{value}' to a status code");
                    None
                }
            },
            Value::String(raw) => Self::parse(raw),
            Value::Array(items) => {
                let codes: Option<Vec<u16>> = items.iter().map(status_code).collect();
                match codes {
                    Some(codes) if !codes.is_empty() => Some(Self::AnyOf(codes)),
                    _ => {
                        warn!("Could not convert expected_status {value} to status codes");
                        None
                    }
                }
            }
            other => {
                warn!("Unsupported expected_status value {other}");
                None
            }
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let parsed = if raw.contains(',') {
            raw.split(',')
                .map(|part| part.trim().parse::<u16>().ok())
                .collect::<Option<Vec<_>>>()
                .filter(|codes| !codes.is_empty())
                .map(Self::AnyOf)
        } else {
            raw.trim().parse::<u16>().ok().map(Self::Single)
        };
        if parsed.is_none() {
            warn!("Could not convert expected_status '{raw}' to a status code");
        }
        parsed
    }
}

fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::String(raw) => raw.trim().parse().ok(),
        other => values::as_u32(other).and_then(|code| u16::try_from(code).ok()),
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(code) => write!(f, "{code}"),
            Self::AnyOf(codes) => {
                let rendered: Vec<String> = codes.iter().map(u16::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<u16> for ExpectedStatus {
    fn from(code: u16) -> Self {
        Self::Single(code)
    }
}

impl From<Vec<u16>> for ExpectedStatus {
    fn from(codes: Vec<u16>) -> Self {
        Self::AnyOf(codes)
    }
}

impl<const N: usize> From<[u16; N]> for ExpectedStatus {
    fn from(codes: [u16; N]) -> Self {
        Self::AnyOf(codes.to_vec())
    }
}

/// Orchestration settings for one call.
///
/// `max_retries` and `delay` stay unset unless the caller provides them; the
/// dispatcher falls back to its configured defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlParams {
    pub max_retries: Option<u32>,
    pub delay: Option<Duration>,
    pub token: Option<String>,
    pub token_type: String,
    pub token_check_on_failure: bool,
    pub auto_refresh: bool,
    pub random_session: bool,
    pub custom_headers: Option<HeaderMap>,
    pub expected_status: Option<ExpectedStatus>,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            max_retries: None,
            delay: None,
            token: None,
            token_type: "Bearer".to_string(),
            token_check_on_failure: false,
            auto_refresh: true,
            random_session: false,
            custom_headers: None,
            expected_status: None,
        }
    }
}

impl ControlParams {
    /// `Authorization` value for the explicit token, if one was given.
    pub fn authorization(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("{} {}", self.token_type, token))
    }

    /// True when `status` satisfies `expected_status` (or none is set).
    pub fn accepts(&self, status: u16) -> bool {
        self.expected_status
            .as_ref()
            .is_none_or(|expected| expected.matches(status))
    }
}

/// Parameters forwarded to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportParams {
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
    /// Keys the built-in transport does not understand.
    pub extra: ParamBag,
}

/// Fully partitioned request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub alias: Option<String>,
    pub endpoint: Option<String>,
    pub url: Option<String>,
    pub control: ControlParams,
    pub transport: TransportParams,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestSpec {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            alias: None,
            endpoint: None,
            url: None,
            control: ControlParams::default(),
            transport: TransportParams::default(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Target a registered session.
    pub fn session(mut self, alias: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Target an absolute URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.control.max_retries = Some(max_retries);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.control.delay = Some(delay);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.control.token = Some(token.into());
        self
    }

    pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
        self.control.token_type = token_type.into();
        self
    }

    pub fn token_check_on_failure(mut self, enabled: bool) -> Self {
        self.control.token_check_on_failure = enabled;
        self
    }

    pub fn auto_refresh(mut self, enabled: bool) -> Self {
        self.control.auto_refresh = enabled;
        self
    }

    pub fn random_session(mut self, enabled: bool) -> Self {
        self.control.random_session = enabled;
        self
    }

    pub fn custom_headers(mut self, headers: HeaderMap) -> Self {
        self.control.custom_headers = Some(headers);
        self
    }

    pub fn expected_status(mut self, expected: impl Into<ExpectedStatus>) -> Self {
        self.control.expected_status = Some(expected.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.transport.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.transport.headers = merge_headers(&self.transport.headers, &headers);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.transport.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.transport.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.transport.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        self
    }

    /// Partitions a keyword call.
    ///
    /// Positional arguments win over bag keys; within the bag the first key
    /// variant present wins. A missing method means `GET`.
    pub fn from_params(
        method: Option<&str>,
        alias: Option<&str>,
        endpoint: Option<&str>,
        url: Option<&str>,
        mut bag: ParamBag,
    ) -> Result<Self, ParamsError> {
        let method_from_bag = take_string(&mut bag, METHOD_KEYS);
        let method = match method.map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => parse_method(raw)?,
            None => match method_from_bag {
                Some(raw) => parse_method(&raw)?,
                None => Method::GET,
            },
        };

        let alias_from_bag = take_string(&mut bag, ALIAS_KEYS);
        let endpoint_from_bag = take_string(&mut bag, ENDPOINT_KEYS);
        let url_from_bag = take_string(&mut bag, URL_KEYS);

        let mut spec = Self::new(method);
        spec.alias = positional(alias).or(alias_from_bag);
        spec.endpoint = positional(endpoint).or(endpoint_from_bag);
        spec.url = positional(url).or(url_from_bag);
        spec.control = take_control(&mut bag)?;
        spec.transport = take_transport(bag)?;
        Ok(spec)
    }

    /// Same as [`RequestSpec::from_params`] with every field taken from the bag.
    pub fn from_bag(bag: ParamBag) -> Result<Self, ParamsError> {
        Self::from_params(None, None, None, None, bag)
    }
}

fn positional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_method(raw: &str) -> Result<Method, ParamsError> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ParamsError::InvalidMethod(raw.to_string()))
}

/// Removes every variant of a key; the first one present supplies the value.
fn take_string(bag: &mut ParamBag, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        if let Some(value) = bag.remove(*key)
            && found.is_none()
            && !value.is_null()
        {
            found = Some(values::as_text(&value));
        }
    }
    found.filter(|value| !value.trim().is_empty())
}

fn take_control(bag: &mut ParamBag) -> Result<ControlParams, ParamsError> {
    let mut control = ControlParams {
        token: take_string(bag, TOKEN_KEYS),
        ..ControlParams::default()
    };

    if let Some(value) = bag.remove("max_retries") {
        control.max_retries = loose(&value, "max_retries", values::as_u32);
    }
    if let Some(value) = bag.remove("delay") {
        control.delay = loose(&value, "delay", values::as_duration);
    }
    if let Some(value) = bag.remove("token_type")
        && let Some(token_type) = values::as_str(&value)
    {
        control.token_type = token_type.to_string();
    }
    if let Some(value) = bag.remove("token_check_on_failure")
        && let Some(flag) = loose(&value, "token_check_on_failure", values::as_bool)
    {
        control.token_check_on_failure = flag;
    }
    if let Some(value) = bag.remove("auto_refresh")
        && let Some(flag) = loose(&value, "auto_refresh", values::as_bool)
    {
        control.auto_refresh = flag;
    }
    if let Some(value) = bag.remove("random_session")
        && let Some(flag) = loose(&value, "random_session", values::as_bool)
    {
        control.random_session = flag;
    }
    if let Some(value) = bag.remove("custom_headers") {
        control.custom_headers = match value {
            Value::Null => None,
            Value::Object(_) => Some(values::headers_from_value(&value)?),
            other => {
                warn!("Ignoring custom_headers {other}: expected a map");
                None
            }
        };
    }
    if let Some(value) = bag.remove("expected_status") {
        control.expected_status = ExpectedStatus::from_value(&value);
    }

    Ok(control)
}

fn loose<T>(value: &Value, key: &str, parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let parsed = parse(value);
    if parsed.is_none() && !value.is_null() {
        warn!("Ignoring {key} value {value}, using default");
    }
    parsed
}

fn take_transport(mut bag: ParamBag) -> Result<TransportParams, ParamsError> {
    let mut transport = TransportParams::default();

    if let Some(value) = bag.remove("headers")
        && !value.is_null()
    {
        transport.headers = values::headers_from_value(&value)?;
    }
    if let Some(value) = bag.remove("params") {
        transport.query = values::query_from_value(&value);
    }
    if let Some(value) = bag.remove("timeout") {
        transport.timeout = loose(&value, "timeout", values::as_duration);
    }

    let json = bag.remove("json").filter(|value| !value.is_null());
    let data = bag.remove("data").filter(|value| !value.is_null());
    transport.body = match (json, data) {
        (Some(json), data) => {
            if data.is_some() {
                warn!("Both json and data given; sending json");
            }
            Some(RequestBody::Json(json))
        }
        (None, Some(Value::String(text))) => Some(RequestBody::Text(text)),
        (None, Some(Value::Object(fields))) => Some(RequestBody::Form(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), values::as_text(value)))
                .collect(),
        )),
        (None, Some(other)) => Some(RequestBody::Text(other.to_string())),
        (None, None) => None,
    };

    transport.extra = bag;
    Ok(transport)
}

/// `overlay` entries replace same-named entries of `base`.
pub fn merge_headers(base: &HeaderMap, overlay: &HeaderMap) -> HeaderMap {
    let mut merged = base.clone();
    for name in overlay.keys() {
        merged.remove(name);
        for value in overlay.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

/// Batch entry parameters: `common`, then the entry's own keys, then the
/// entry's `kwargs` map, later layers winning.
pub fn merge_batch_params(common: &ParamBag, entry: &ParamBag) -> ParamBag {
    let mut merged = common.clone();
    for (key, value) in entry {
        if key != "kwargs" {
            merged.insert(key.clone(), value.clone());
        }
    }
    if let Some(Value::Object(kwargs)) = entry.get("kwargs") {
        for (key, value) in kwargs {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
