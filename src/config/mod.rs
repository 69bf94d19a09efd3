//! Relay configuration.
//!
//! [`ApiRelayConfig`] can be built in code (usually through
//! [`ApiRelayBuilder`](crate::ApiRelayBuilder)) or loaded from JSON. Durations
//! are written as seconds, fractional values allowed.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::{DEFAULT_CACHE_CAPACITY, ResponseOptions};
use crate::session::AliasPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiRelayConfig {
    pub token_endpoint: Option<String>,
    #[serde(with = "seconds")]
    pub token_timeout: Duration,
    /// Applied to calls that do not set their own `timeout`.
    #[serde(with = "seconds")]
    pub global_timeout: Duration,
    pub default_max_retries: u32,
    #[serde(with = "seconds")]
    pub default_retry_delay: Duration,
    pub auto_json: bool,
    pub auto_log: bool,
    pub detailed_response: bool,
    pub return_json: bool,
    pub response_cache_capacity: usize,
    pub alias_policy: AliasPolicy,
    pub enable_metrics: bool,
    pub user_agent: Option<String>,
}

impl Default for ApiRelayConfig {
    fn default() -> Self {
        Self {
            token_endpoint: None,
            token_timeout: Duration::from_secs(10),
            global_timeout: Duration::from_secs(30),
            default_max_retries: 3,
            default_retry_delay: Duration::from_secs(2),
            auto_json: true,
            auto_log: true,
            detailed_response: true,
            return_json: true,
            response_cache_capacity: DEFAULT_CACHE_CAPACITY,
            alias_policy: AliasPolicy::Overwrite,
            enable_metrics: true,
            user_agent: None,
        }
    }
}

impl ApiRelayConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn response_options(&self) -> ResponseOptions {
        ResponseOptions {
            auto_json: self.auto_json,
            detailed_response: self.detailed_response,
            return_json: self.return_json,
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
