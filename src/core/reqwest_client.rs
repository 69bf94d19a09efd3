//! Reqwest-based implementation of the [`Transport`] trait.
//!
//! Every session binding gets its own `reqwest::Client` with the session's
//! default headers, timeout, proxy and TLS settings, plus a private cookie jar.
//! Ad-hoc calls share one cookie-less client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, ClientBuilder};
use url::Url;

use super::types::{BasicAuth, RawResponse, RequestBody, SessionProfile, TransportRequest};
use super::{Connection, Transport, TransportError};

/// Reqwest-backed transport.
pub struct ReqwestTransport {
    client: Client,
    user_agent: Option<String>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_user_agent(None)
    }

    pub fn with_user_agent(user_agent: Option<String>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(ref agent) = user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;

        Ok(Self { client, user_agent })
    }

    fn session_builder(&self, profile: &SessionProfile, jar: Arc<Jar>) -> Result<ClientBuilder, TransportError> {
        let bind_error = |reason: String| TransportError::Bind {
            alias: profile.alias.clone(),
            reason,
        };

        let mut builder = Client::builder()
            .cookie_provider(jar)
            .default_headers(profile.headers.clone())
            .danger_accept_invalid_certs(!profile.options.verify);

        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        if let Some(timeout) = profile.options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ref endpoint) = profile.options.proxy {
            let proxy = reqwest::Proxy::all(endpoint).map_err(|err| bind_error(err.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn bind(&self, profile: &SessionProfile) -> Result<Arc<dyn Connection>, TransportError> {
        let jar = Arc::new(Jar::default());
        let client = self
            .session_builder(profile, jar.clone())?
            .build()
            .map_err(|err| TransportError::Bind {
                alias: profile.alias.clone(),
                reason: err.to_string(),
            })?;

        Ok(Arc::new(ReqwestConnection {
            client,
            jar,
            base_url: Url::parse(&profile.base_url).ok(),
            auth: profile.options.auth.clone(),
        }))
    }

    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        execute(&self.client, request, None).await
    }
}

/// Session binding backed by a dedicated reqwest client.
pub struct ReqwestConnection {
    client: Client,
    jar: Arc<Jar>,
    base_url: Option<Url>,
    auth: Option<BasicAuth>,
}

#[async_trait]
impl Connection for ReqwestConnection {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        execute(&self.client, request, self.auth.as_ref()).await
    }

    fn cookies(&self) -> HashMap<String, String> {
        self.base_url
            .as_ref()
            .and_then(|url| self.jar.cookies(url))
            .and_then(|value| value.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default()
    }
}

async fn execute(
    client: &Client,
    request: TransportRequest,
    auth: Option<&BasicAuth>,
) -> Result<RawResponse, TransportError> {
    let mut builder = client
        .request(request.method, request.url)
        .headers(request.headers);

    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(auth) = auth {
        builder = builder.basic_auth(&auth.username, auth.password.as_ref());
    }
    builder = match request.body {
        Some(RequestBody::Json(value)) => builder.json(&value),
        Some(RequestBody::Form(fields)) => builder.form(&fields),
        Some(RequestBody::Text(text)) => builder.body(text),
        Some(RequestBody::Bytes(bytes)) => builder.body(bytes),
        None => builder,
    };

    let started = Instant::now();
    let response = builder.send().await.map_err(map_error)?;
    let elapsed = started.elapsed();

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let url = response.url().clone();
    let cookies = response
        .cookies()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect();
    let body = response.bytes().await.map_err(map_error)?;

    Ok(RawResponse {
        status,
        headers,
        cookies,
        body,
        url,
        elapsed,
    })
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
