//! Event system for request orchestration.
//!
//! The relay emits one event per send, failure, retry and token refresh.
//! Handlers turn them into log lines and metrics.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::Method;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::metrics::MetricsCollector;

/// Characters of a response body kept in error log lines.
pub const BODY_PREVIEW_LIMIT: usize = 1000;

/// Target label of calls that bypass the session store.
pub const DIRECT_TARGET: &str = "DIRECT";

#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub target: String,
    pub method: Method,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub target: String,
    pub method: Method,
    pub url: String,
    pub status: u16,
    pub latency: Duration,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub target: String,
    pub method: Method,
    pub url: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RetryEvent {
    pub target: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub received: Option<u16>,
    pub scheduled_after: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenRefreshEvent {
    pub alias: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum RelayEvent {
    Request(RequestEvent),
    Response(ResponseEvent),
    Failure(FailureEvent),
    Retry(RetryEvent),
    TokenRefresh(TokenRefreshEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &RelayEvent);
}

/// Broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: RelayEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Logs request outcomes through the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler {
    enabled: AtomicBool,
}

impl Default for LoggingHandler {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LoggingHandler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &RelayEvent) {
        if !self.is_enabled() {
            return;
        }
        match event {
            RelayEvent::Request(request) => {
                log::debug!("-> {} {} ({})", request.method, request.url, request.target);
            }
            RelayEvent::Response(response) if response.status >= 400 => {
                log::error!(
                    "API request error: target={} method={} url={} status={} body={}",
                    response.target,
                    response.method,
                    response.url,
                    response.status,
                    body_preview(response.content_type.as_deref(), &response.body)
                );
            }
            RelayEvent::Response(response) => {
                log::info!(
                    "API request success: target={} method={} url={} status={} ({:.3}s)",
                    response.target,
                    response.method,
                    response.url,
                    response.status,
                    response.latency.as_secs_f64()
                );
            }
            RelayEvent::Failure(failure) => {
                log::error!(
                    "API request failed: target={} method={} url={} error={}",
                    failure.target,
                    failure.method,
                    failure.url,
                    failure.error
                );
            }
            RelayEvent::Retry(retry) => {
                log::debug!(
                    "retry {} attempt {}/{} after {:.2}s (status {:?})",
                    retry.target,
                    retry.attempt,
                    retry.max_attempts,
                    retry.scheduled_after.as_secs_f64(),
                    retry.received
                );
            }
            RelayEvent::TokenRefresh(refresh) if refresh.success => {
                log::info!("Token refreshed for session '{}'", refresh.alias);
            }
            RelayEvent::TokenRefresh(refresh) => {
                log::warn!("Token refresh failed for session '{}'", refresh.alias);
            }
        }
    }
}

/// Pretty-printed JSON or plain text, cut to [`BODY_PREVIEW_LIMIT`] characters.
pub fn body_preview(content_type: Option<&str>, body: &Bytes) -> String {
    if body.is_empty() {
        return "No Content".to_string();
    }
    let is_json = content_type
        .map(|value| value.to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);
    let rendered = if is_json {
        serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
    } else {
        String::from_utf8_lossy(body).into_owned()
    };

    match rendered.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}

/// Feeds the metrics collector.
#[derive(Clone, Debug)]
pub struct MetricsHandler {
    metrics: MetricsCollector,
}

impl MetricsHandler {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self { metrics }
    }
}

impl EventHandler for MetricsHandler {
    fn handle(&self, event: &RelayEvent) {
        match event {
            RelayEvent::Response(response) => {
                self.metrics
                    .record_response(&response.target, response.status, response.latency);
            }
            RelayEvent::Failure(failure) => {
                self.metrics.record_error(&failure.target);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CountingHandler(Mutex<usize>);

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &RelayEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    fn failure(target: &str) -> RelayEvent {
        RelayEvent::Failure(FailureEvent {
            target: target.into(),
            method: Method::GET,
            url: "https://api.example.com/health".into(),
            error: "timeout".into(),
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn dispatches_to_handlers() {
        let mut dispatcher = EventDispatcher::new();
        let counter = Arc::new(CountingHandler(Mutex::new(0)));
        dispatcher.register_handler(counter.clone());
        dispatcher.register_handler(Arc::new(LoggingHandler::new(false)));
        dispatcher.dispatch(failure("api"));
        assert_eq!(*counter.0.lock().unwrap(), 1);
        assert_eq!(dispatcher.len(), 2);
    }

    #[test]
    fn metrics_handler_records_failures() {
        let metrics = MetricsCollector::new();
        MetricsHandler::new(metrics.clone()).handle(&failure("api"));
        assert_eq!(metrics.snapshot().target("api").unwrap().failures, 1);
    }

    #[test]
    fn body_preview_truncates_and_pretty_prints() {
        let long = Bytes::from("x".repeat(BODY_PREVIEW_LIMIT + 50));
        let preview = body_preview(Some("text/plain"), &long);
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
        assert!(preview.ends_with("..."));

        let json = Bytes::from_static(br#"{"error":"bad"}"#);
        assert_eq!(
            body_preview(Some("application/json; charset=utf-8"), &json),
            "{\n  \"error\": \"bad\"\n}"
        );
        assert_eq!(body_preview(None, &Bytes::new()), "No Content");
    }
}
