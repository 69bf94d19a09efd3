//! Bearer token validation and refresh against a remote auth endpoint.
//!
//! The endpoint receives `POST` with the current token in a `RefreshToken`
//! header and answers with `auth_token` / `auth_expires_at` on success. Every
//! failure is logged and reported as "invalid" or "no token"; nothing is
//! propagated to the caller.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use log::{debug, error, warn};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

pub const AUTH_TOKEN_FIELD: &str = "auth_token";
pub const AUTH_EXPIRY_FIELD: &str = "auth_expires_at";
pub const REFRESH_TOKEN_HEADER: &str = "RefreshToken";

const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no token endpoint configured")]
    NoEndpoint,
    #[error("token endpoint request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint answered with status {0}")]
    Status(u16),
}

/// Validates and refreshes bearer tokens.
#[derive(Debug)]
pub struct TokenAuthority {
    endpoint: RwLock<Option<String>>,
    client: Client,
    timeout: Duration,
}

impl TokenAuthority {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        Self {
            endpoint: RwLock::new(endpoint),
            client,
            timeout: DEFAULT_TOKEN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> Option<String> {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_endpoint(&self, endpoint: Option<String>) {
        debug!("Token endpoint set to {endpoint:?}");
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = endpoint;
    }

    /// Token carried by the `Authorization` header, without a `Bearer ` prefix.
    pub fn extract_token(headers: &HeaderMap) -> Option<String> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        let token = match value.strip_prefix("Bearer") {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
            _ => value,
        };
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// True when the endpoint confirms the token with both token fields.
    pub async fn validate(&self, headers: &HeaderMap) -> bool {
        let Some(token) = Self::extract_token(headers) else {
            debug!("Token validation skipped: no Authorization header");
            return false;
        };

        match self.exchange(&token).await {
            Ok(body) => body.get(AUTH_TOKEN_FIELD).is_some() && body.get(AUTH_EXPIRY_FIELD).is_some(),
            Err(TokenError::Status(status)) => {
                debug!("Token rejected with status {status}");
                false
            }
            Err(err) => {
                error!("Token validation error: {err}");
                false
            }
        }
    }

    /// New token issued by the endpoint, if any.
    pub async fn refresh(&self, headers: &HeaderMap) -> Option<String> {
        let token = Self::extract_token(headers)?;

        match self.exchange(&token).await {
            Ok(body) => match body.get(AUTH_TOKEN_FIELD) {
                Some(Value::String(fresh)) => Some(fresh.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => {
                    warn!("Failed to refresh token: response has no {AUTH_TOKEN_FIELD}");
                    None
                }
            },
            Err(TokenError::Status(status)) => {
                warn!("Failed to refresh token: status {status}");
                None
            }
            Err(err) => {
                error!("Token refresh error: {err}");
                None
            }
        }
    }

    /// Posts `token` and returns the decoded body of a 200 answer.
    async fn exchange(&self, token: &str) -> Result<Value, TokenError> {
        let endpoint = self.endpoint().ok_or(TokenError::NoEndpoint)?;

        let response = self
            .client
            .post(&endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFRESH_TOKEN_HEADER, token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(TokenError::Status(status));
        }

        // Non-JSON bodies count as a response lacking both fields.
        Ok(response.json::<Value>().await.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extract_token_strips_bearer_prefix() {
        assert_eq!(
            TokenAuthority::extract_token(&with_auth("Bearer abc123")).as_deref(),
            Some("abc123")
        );
        assert_eq!(
            TokenAuthority::extract_token(&with_auth("Token xyz")).as_deref(),
            Some("Token xyz")
        );
        assert!(TokenAuthority::extract_token(&with_auth("Bearer ")).is_none());
        assert!(TokenAuthority::extract_token(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn missing_endpoint_fails_closed() {
        let authority = TokenAuthority::new(Client::new(), None);
        let headers = with_auth("Bearer abc123");
        assert!(!authority.validate(&headers).await);
        assert!(authority.refresh(&headers).await.is_none());
    }

    #[test]
    fn endpoint_is_mutable() {
        let authority = TokenAuthority::new(Client::new(), None);
        authority.set_endpoint(Some("https://auth.example.com/refresh".into()));
        assert_eq!(
            authority.endpoint().as_deref(),
            Some("https://auth.example.com/refresh")
        );
    }
}
