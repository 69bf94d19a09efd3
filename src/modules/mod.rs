//! Cross-cutting services: request events and send metrics.

pub mod events;
pub mod metrics;

pub use events::{
    EventDispatcher, EventHandler, FailureEvent, LoggingHandler, MetricsHandler, RelayEvent,
    RequestEvent, ResponseEvent, RetryEvent, TokenRefreshEvent,
};
pub use metrics::{GlobalStats, MetricsCollector, MetricsSnapshot, TargetStats};
