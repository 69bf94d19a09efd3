//! # api-relay
//!
//! Resilient HTTP request orchestration for API test harnesses.
//!
//! The relay keeps named sessions (base URL, default headers, transport
//! options), retries calls with a fixed delay until an expected status shows
//! up, refreshes bearer tokens against a configurable endpoint and hands back
//! responses in one of three normalized shapes.
//!
//! ## Features
//!
//! - Named sessions with atomic header replacement
//! - Retry with fixed backoff and expected-status matching
//! - Token validation and refresh on 401/403
//! - One-off header overrides through disposable sessions
//! - Sequential batch sends and poll-until helpers
//! - JSON, lazy wrapper or raw response envelopes with status recovery
//!
//! ## Example
//!
//! ```no_run
//! use api_relay::{ApiRelay, RequestSpec};
//! use http::HeaderMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = ApiRelay::new()?;
//!     relay.sessions().create(
//!         "api",
//!         "https://api.example.com",
//!         HeaderMap::new(),
//!         Default::default(),
//!     )?;
//!
//!     let request = RequestSpec::get()
//!         .session("api", "/health")
//!         .expected_status(200)
//!         .max_retries(3)
//!         .delay(Duration::from_secs(1));
//!     if let Some(envelope) = relay.send(request).await {
//!         println!("status: {:?}", relay.responses().status_code(&envelope));
//!     }
//!     Ok(())
//! }
//! ```

mod api_relay;
mod polling;

pub mod config;
pub mod core;
pub mod modules;
pub mod params;
pub mod response;
pub mod session;
pub mod token;

pub use crate::api_relay::{ApiRelay, ApiRelayBuilder, RelayError, RelayResult};

pub use crate::config::{ApiRelayConfig, ConfigError};

pub use crate::core::{
    BasicAuth, Connection, RawResponse, RequestBody, ReqwestTransport, SessionOptions,
    SessionProfile, Transport, TransportError, TransportRequest,
};

pub use crate::modules::{
    EventDispatcher, EventHandler, LoggingHandler, MetricsCollector, MetricsHandler,
    MetricsSnapshot, RelayEvent, TargetStats,
};

pub use crate::params::{ControlParams, ExpectedStatus, ParamBag, RequestSpec, TransportParams};

pub use crate::response::{
    Envelope, JsonBody, ResponseCache, ResponseId, ResponseNormalizer, ResponseOptions,
    ResponseWrapper,
};

pub use crate::session::{AliasPolicy, Session, SessionDetails, SessionError, SessionStore};

pub use crate::token::TokenAuthority;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
