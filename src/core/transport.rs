//! Transport abstraction consumed by the session store and the dispatcher.
//!
//! A [`Transport`] issues per-session [`Connection`]s (base URL, default
//! headers and options baked in) and also performs one-off calls against
//! absolute URLs. Implementations are expected to keep cookies for the
//! lifetime of a connection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{RawResponse, SessionProfile, TransportRequest};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the binding backing a named session.
    fn bind(&self, profile: &SessionProfile) -> Result<Arc<dyn Connection>, TransportError>;

    /// Ad-hoc call that does not go through a session.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Connection profile issued for a single session binding.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;

    /// Cookies currently held for the session's base URL.
    fn cookies(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Request(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to bind session '{alias}': {reason}")]
    Bind { alias: String, reason: String },
}
