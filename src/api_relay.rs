//! Request orchestration.
//!
//! [`ApiRelay`] ties the session store, token authority and response
//! normalizer together: it resolves a call to a session or an absolute URL,
//! retries with a fixed delay, refreshes bearer tokens on auth failures and
//! hands back a normalized [`Envelope`]. Every operation runs to completion on
//! the caller's task.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use http::Method;
use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

use crate::config::ApiRelayConfig;
use crate::core::{
	Connection, ReqwestTransport, SessionOptions, Transport, TransportError, TransportRequest,
	join_endpoint, split_url,
};
use crate::modules::events::{
	DIRECT_TARGET, EventDispatcher, EventHandler, FailureEvent, LoggingHandler, MetricsHandler,
	RelayEvent, RequestEvent, ResponseEvent, RetryEvent, TokenRefreshEvent,
};
use crate::modules::metrics::{MetricsCollector, MetricsSnapshot};
use crate::params::{
	ControlParams, ParamBag, ParamsError, RequestSpec, TransportParams, merge_batch_params,
};
use crate::response::{Envelope, ResponseNormalizer, ResponseOptions};
use crate::session::{AliasPolicy, SessionError, SessionStore, short_id};
use crate::token::TokenAuthority;

/// Result alias used across the orchestration layer.
pub type RelayResult<T> = Result<T, RelayError>;

/// Why a call produced no usable envelope.
#[derive(Debug, Error)]
pub enum RelayError {
	#[error("either an alias or a URL must be provided")]
	MissingTarget,
	#[error("session '{0}' not found")]
	SessionNotFound(String),
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),
	#[error("token for session '{0}' is expired and could not be refreshed")]
	TokenRefresh(String),
	#[error("response body is not JSON: {0}")]
	Decode(String),
	#[error("invalid HTTP method '{0}'")]
	InvalidMethod(String),
	#[error("invalid url '{url}': {reason}")]
	InvalidUrl { url: String, reason: String },
	#[error("invalid header {0}")]
	InvalidHeader(String),
	#[error("session error: {0}")]
	Session(SessionError),
	#[error("timed out after {waited:?} waiting for {condition}")]
	Timeout {
		waited: Duration,
		condition: String,
		last: Option<Box<Envelope>>,
	},
	#[error("http client initialisation failed: {0}")]
	Client(#[from] reqwest::Error),
}

impl RelayError {
	/// Errors caused by the call itself rather than by the remote side.
	pub fn is_malformed_call(&self) -> bool {
		matches!(
			self,
			Self::MissingTarget
				| Self::InvalidMethod(_)
				| Self::InvalidUrl { .. }
				| Self::InvalidHeader(_)
				| Self::SessionNotFound(_)
		)
	}
}

impl From<SessionError> for RelayError {
	fn from(err: SessionError) -> Self {
		match err {
			SessionError::NotFound(alias) => Self::SessionNotFound(alias),
			other => Self::Session(other),
		}
	}
}

impl From<ParamsError> for RelayError {
	fn from(err: ParamsError) -> Self {
		match err {
			ParamsError::InvalidMethod(method) => Self::InvalidMethod(method),
			ParamsError::InvalidHeader(header) => Self::InvalidHeader(header),
		}
	}
}

/// Fluent builder for [`ApiRelay`].
pub struct ApiRelayBuilder {
	config: ApiRelayConfig,
	transport: Option<Arc<dyn Transport>>,
	token_client: Option<reqwest::Client>,
	handlers: Vec<Arc<dyn EventHandler>>,
}

impl ApiRelayBuilder {
	pub fn new() -> Self {
		Self {
			config: ApiRelayConfig::default(),
			transport: None,
			token_client: None,
			handlers: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: ApiRelayConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.config.token_endpoint = Some(endpoint.into());
		self
	}

	pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
		self.config.token_timeout = timeout;
		self
	}

	pub fn with_global_timeout(mut self, timeout: Duration) -> Self {
		self.config.global_timeout = timeout;
		self
	}

	pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
		self.config.default_max_retries = max_retries.max(1);
		self
	}

	pub fn with_default_retry_delay(mut self, delay: Duration) -> Self {
		self.config.default_retry_delay = delay;
		self
	}

	pub fn with_response_options(mut self, options: ResponseOptions) -> Self {
		self.config.auto_json = options.auto_json;
		self.config.detailed_response = options.detailed_response;
		self.config.return_json = options.return_json;
		self
	}

	pub fn with_response_cache_capacity(mut self, capacity: usize) -> Self {
		self.config.response_cache_capacity = capacity;
		self
	}

	pub fn with_alias_policy(mut self, policy: AliasPolicy) -> Self {
		self.config.alias_policy = policy;
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.config.user_agent = Some(user_agent.into());
		self
	}

	/// Replace the reqwest transport, e.g. with a scripted one in tests.
	pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Client used for token endpoint calls.
	pub fn with_token_client(mut self, client: reqwest::Client) -> Self {
		self.token_client = Some(client);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	pub fn disable_auto_log(mut self) -> Self {
		self.config.auto_log = false;
		self
	}

	pub fn disable_metrics(mut self) -> Self {
		self.config.enable_metrics = false;
		self
	}

	pub fn build(self) -> RelayResult<ApiRelay> {
		ApiRelay::with_parts(self)
	}
}

impl Default for ApiRelayBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Where a call goes.
#[derive(Debug, Clone)]
enum Target {
	Session { alias: String, endpoint: String },
	Direct(String),
}

/// A resolved call, ready to be sent any number of times.
#[derive(Debug, Clone)]
struct Call {
	method: Method,
	target: Target,
	transport: TransportParams,
}

/// Main request orchestrator.
pub struct ApiRelay {
	sessions: SessionStore,
	tokens: TokenAuthority,
	responses: ResponseNormalizer,
	transport: Arc<dyn Transport>,
	events: EventDispatcher,
	logger: Arc<LoggingHandler>,
	metrics: Option<MetricsCollector>,
	global_timeout: RwLock<Duration>,
	default_max_retries: u32,
	default_retry_delay: Duration,
}

impl ApiRelay {
	/// Construct a relay with default configuration.
	pub fn new() -> RelayResult<Self> {
		Self::builder().build()
	}

	pub fn builder() -> ApiRelayBuilder {
		ApiRelayBuilder::new()
	}

	pub fn from_config(config: ApiRelayConfig) -> RelayResult<Self> {
		Self::builder().with_config(config).build()
	}

	fn with_parts(parts: ApiRelayBuilder) -> RelayResult<Self> {
		let ApiRelayBuilder {
			config,
			transport,
			token_client,
			handlers,
		} = parts;

		let transport: Arc<dyn Transport> = match transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::with_user_agent(config.user_agent.clone())?),
		};
		let token_client = match token_client {
			Some(client) => client,
			None => reqwest::Client::builder().build()?,
		};

		let sessions = SessionStore::new(transport.clone()).with_policy(config.alias_policy);
		let tokens = TokenAuthority::new(token_client, config.token_endpoint.clone())
			.with_timeout(config.token_timeout);
		let responses =
			ResponseNormalizer::new(config.response_options(), config.response_cache_capacity);

		let logger = Arc::new(LoggingHandler::new(config.auto_log));
		let metrics = config.enable_metrics.then(MetricsCollector::new);

		let mut events = EventDispatcher::new();
		events.register_handler(logger.clone());
		if let Some(ref collector) = metrics {
			events.register_handler(Arc::new(MetricsHandler::new(collector.clone())));
		}
		for handler in handlers {
			events.register_handler(handler);
		}

		Ok(Self {
			sessions,
			tokens,
			responses,
			transport,
			events,
			logger,
			metrics,
			global_timeout: RwLock::new(config.global_timeout),
			default_max_retries: config.default_max_retries.max(1),
			default_retry_delay: config.default_retry_delay,
		})
	}

	pub fn sessions(&self) -> &SessionStore {
		&self.sessions
	}

	pub fn tokens(&self) -> &TokenAuthority {
		&self.tokens
	}

	pub fn responses(&self) -> &ResponseNormalizer {
		&self.responses
	}

	pub fn metrics(&self) -> Option<MetricsSnapshot> {
		self.metrics.as_ref().map(MetricsCollector::snapshot)
	}

	pub fn global_timeout(&self) -> Duration {
		*self.global_timeout.read().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn set_global_timeout(&self, timeout: Duration) {
		*self
			.global_timeout
			.write()
			.unwrap_or_else(PoisonError::into_inner) = timeout;
		info!("Global timeout set to {:.1} seconds", timeout.as_secs_f64());
	}

	pub fn set_token_endpoint(&self, endpoint: impl Into<String>) {
		let endpoint = endpoint.into();
		info!("Token endpoint set to: {endpoint}");
		self.tokens.set_endpoint(Some(endpoint));
	}

	pub fn set_response_options(&self, options: ResponseOptions) {
		self.responses.set_options(options);
		info!(
			"Response handling options updated: auto_json={}, detailed_response={}, return_json={}",
			options.auto_json, options.detailed_response, options.return_json
		);
	}

	pub fn set_auto_log(&self, enabled: bool) {
		self.logger.set_enabled(enabled);
	}

	pub fn auto_log(&self) -> bool {
		self.logger.is_enabled()
	}

	/// Sends a request; failures are logged and yield `None`.
	pub async fn send(&self, spec: RequestSpec) -> Option<Envelope> {
		lenient(self.try_send(spec).await)
	}

	/// Sends a request and reports why no envelope was produced.
	///
	/// An envelope carrying an unexpected status is still `Ok`; callers
	/// inspect it.
	pub async fn try_send(&self, spec: RequestSpec) -> RelayResult<Envelope> {
		self.dispatch(spec).await
	}

	/// Keyword-style entry point; see [`RequestSpec::from_params`].
	pub async fn send_params(
		&self,
		method: Option<&str>,
		alias: Option<&str>,
		endpoint: Option<&str>,
		url: Option<&str>,
		params: ParamBag,
	) -> Option<Envelope> {
		lenient(self.try_send_params(method, alias, endpoint, url, params).await)
	}

	pub async fn try_send_params(
		&self,
		method: Option<&str>,
		alias: Option<&str>,
		endpoint: Option<&str>,
		url: Option<&str>,
		params: ParamBag,
	) -> RelayResult<Envelope> {
		let spec = RequestSpec::from_params(method, alias, endpoint, url, params)?;
		self.dispatch(spec).await
	}

	/// Sends every entry in order. A failing entry leaves `None` in its slot.
	pub async fn send_batch(&self, requests: &[ParamBag], common: &ParamBag) -> Vec<Option<Envelope>> {
		self.try_send_batch(requests, common)
			.await
			.into_iter()
			.enumerate()
			.map(|(index, outcome)| match outcome {
				Ok(envelope) => Some(envelope),
				Err(err) => {
					error!("Error processing request at index {index}: {err}");
					None
				}
			})
			.collect()
	}

	/// Entry keys override `common`; an entry's `kwargs` map overrides both.
	pub async fn try_send_batch(
		&self,
		requests: &[ParamBag],
		common: &ParamBag,
	) -> Vec<RelayResult<Envelope>> {
		let mut outcomes = Vec::with_capacity(requests.len());
		for entry in requests {
			let merged = merge_batch_params(common, entry);
			let outcome = match RequestSpec::from_bag(merged) {
				Ok(spec) => self.dispatch(spec).await,
				Err(err) => Err(err.into()),
			};
			outcomes.push(outcome);
		}
		outcomes
	}

	/// Typed batch: sends each spec in order.
	pub async fn send_all(&self, specs: impl IntoIterator<Item = RequestSpec>) -> Vec<Option<Envelope>> {
		let mut envelopes = Vec::new();
		for spec in specs {
			envelopes.push(self.send(spec).await);
		}
		envelopes
	}

	/// Decoded body of `envelope`.
	pub fn try_json(&self, envelope: &Envelope) -> RelayResult<Value> {
		envelope.json().ok_or_else(|| {
			let status = self
				.responses
				.status_code(envelope)
				.map_or_else(|| "unknown".to_string(), |code| code.to_string());
			RelayError::Decode(format!("status {status}"))
		})
	}

	/// True when the session's token is still accepted by the token endpoint.
	pub async fn check_token_expiration(&self, alias: &str) -> bool {
		match self.sessions.headers(alias) {
			Some(headers) => self.tokens.validate(&headers).await,
			None => {
				warn!("Session '{alias}' not found!");
				false
			}
		}
	}

	/// Sets `Authorization: <token_type> <token>` on the session, keeping its
	/// other headers.
	pub fn update_session_token(&self, alias: &str, token: &str, token_type: &str) -> bool {
		self.apply_authorization(alias, &format!("{token_type} {token}"))
	}

	pub async fn refresh_session_token(&self, alias: &str) -> bool {
		let Some(headers) = self.sessions.headers(alias) else {
			warn!("Session '{alias}' not found!");
			return false;
		};
		let refreshed = match self.tokens.refresh(&headers).await {
			Some(token) => self.update_session_token(alias, &token, "Bearer"),
			None => false,
		};
		self.emit_token_refresh(alias, refreshed);
		refreshed
	}

	pub fn create_session_with_token(
		&self,
		alias: &str,
		url: &str,
		token: &str,
		token_type: &str,
		headers: HeaderMap,
		options: SessionOptions,
	) -> RelayResult<String> {
		let mut headers = headers;
		headers.insert(AUTHORIZATION, authorization_value(&format!("{token_type} {token}"))?);
		Ok(self.sessions.create(alias, url, headers, options)?)
	}

	async fn dispatch(&self, spec: RequestSpec) -> RelayResult<Envelope> {
		let RequestSpec {
			method,
			alias,
			endpoint,
			url,
			control,
			transport,
		} = spec;
		let max_retries = control.max_retries.unwrap_or(self.default_max_retries).max(1);
		let delay = control.delay.unwrap_or(self.default_retry_delay);

		let mut disposable = None;
		let target = match (alias, url) {
			(Some(alias), _) => {
				if let Some(custom) = control.custom_headers.clone() {
					return self
						.send_with_custom_headers(method, &alias, endpoint.unwrap_or_default(), custom, transport)
						.await;
				}
				Target::Session {
					alias,
					endpoint: endpoint.unwrap_or_default(),
				}
			}
			(None, Some(url)) if control.random_session => {
				let (base, path) = split_url(&url);
				let mut headers = transport.headers.clone();
				if let Some(value) = control.authorization() {
					headers.insert(AUTHORIZATION, authorization_value(&value)?);
				}
				let alias = self.sessions.create_random(base, headers, SessionOptions::default())?;
				disposable = Some(alias.clone());
				Target::Session {
					alias,
					endpoint: path,
				}
			}
			(None, Some(url)) => Target::Direct(url),
			(None, None) => {
				error!("Either alias or URL must be provided");
				return Err(RelayError::MissingTarget);
			}
		};

		let call = Call {
			method,
			target,
			transport,
		};
		let outcome = if max_retries > 1 {
			self.send_with_retries(&call, &control, max_retries, delay).await
		} else if control.token_check_on_failure
			&& let Target::Session { alias, .. } = &call.target
		{
			self.send_with_token_check(&call, alias, &control).await
		} else {
			self.send_once(&call).await
		};

		if let Some(alias) = disposable {
			self.sessions.delete(&alias);
		}
		outcome
	}

	async fn send_with_retries(
		&self,
		call: &Call,
		control: &ControlParams,
		max_retries: u32,
		delay: Duration,
	) -> RelayResult<Envelope> {
		let url = self.describe(&call.target);
		let expected = control
			.expected_status
			.as_ref()
			.map_or_else(|| "any".to_string(), ToString::to_string);
		let mut last = Err(RelayError::Transport(TransportError::Request(
			"no attempt made".into(),
		)));

		for attempt in 1..=max_retries {
			let outcome = self.send_once(call).await;
			// Only transport failures are worth another attempt.
			if matches!(&outcome, Err(err) if !matches!(err, RelayError::Transport(_))) {
				return outcome;
			}
			let received = outcome
				.as_ref()
				.ok()
				.and_then(|envelope| self.responses.status_code(envelope));

			match received {
				Some(status) if control.accepts(status) => return outcome,
				Some(status) => {
					warn!(
						"Retry {attempt}/{max_retries} - Status check failed: expected {expected}, received {status}, url {url}"
					);
				}
				None => {
					warn!("Retry {attempt}/{max_retries} - No valid response received, url {url}");
				}
			}
			last = outcome;

			if attempt < max_retries {
				self.events.dispatch(RelayEvent::Retry(RetryEvent {
					target: self.label(&call.target),
					attempt,
					max_attempts: max_retries,
					received,
					scheduled_after: delay,
					timestamp: chrono::Utc::now(),
				}));
				sleep(delay).await;
			}
		}

		if control.token_check_on_failure
			&& let Target::Session { alias, .. } = &call.target
			&& let Ok(envelope) = &last
			&& matches!(self.responses.status_code(envelope), Some(401 | 403))
		{
			info!("Attempting token refresh after failed retries");
			if self.handle_token_refresh(alias, control).await {
				info!("Token refreshed, making final attempt");
				return self.send_once(call).await;
			}
		}

		error!(
			"Request failed after {max_retries} retries: {} {url}",
			call.method
		);
		last
	}

	async fn send_with_token_check(
		&self,
		call: &Call,
		alias: &str,
		control: &ControlParams,
	) -> RelayResult<Envelope> {
		let headers = self
			.sessions
			.headers(alias)
			.ok_or_else(|| RelayError::SessionNotFound(alias.to_string()))?;

		if !self.tokens.validate(&headers).await && !self.handle_token_refresh(alias, control).await {
			warn!("Token is expired for session '{alias}' and refresh failed");
			return Err(RelayError::TokenRefresh(alias.to_string()));
		}
		self.send_once(call).await
	}

	/// Sends once through a temporary copy of the session carrying `headers`.
	///
	/// The original session is left untouched and the copy is removed whatever
	/// the outcome.
	async fn send_with_custom_headers(
		&self,
		method: Method,
		alias: &str,
		endpoint: String,
		headers: HeaderMap,
		transport: TransportParams,
	) -> RelayResult<Envelope> {
		let Some(session) = self.sessions.get(alias) else {
			warn!("Session '{alias}' not found!");
			return Err(RelayError::SessionNotFound(alias.to_string()));
		};

		let temp_alias = format!("temp_{alias}_{}", short_id());
		self.sessions.create(
			temp_alias.clone(),
			session.base_url(),
			headers,
			session.options().clone(),
		)?;

		let call = Call {
			method,
			target: Target::Session {
				alias: temp_alias.clone(),
				endpoint,
			},
			transport,
		};
		let outcome = self.send_once(&call).await;
		self.sessions.delete(&temp_alias);
		outcome
	}

	/// Explicit token first, then the token endpoint when `auto_refresh` is on.
	async fn handle_token_refresh(&self, alias: &str, control: &ControlParams) -> bool {
		let refreshed = if let Some(value) = control.authorization() {
			self.apply_authorization(alias, &value)
		} else if control.auto_refresh {
			match self.sessions.headers(alias) {
				Some(headers) => match self.tokens.refresh(&headers).await {
					Some(token) => {
						self.apply_authorization(alias, &format!("{} {token}", control.token_type))
					}
					None => false,
				},
				None => false,
			}
		} else {
			false
		};

		self.emit_token_refresh(alias, refreshed);
		refreshed
	}

	fn apply_authorization(&self, alias: &str, value: &str) -> bool {
		let header = match authorization_value(value) {
			Ok(header) => header,
			Err(err) => {
				warn!("Cannot set token on session '{alias}': {err}");
				return false;
			}
		};
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, header);
		match self.sessions.merge_headers(alias, headers) {
			Ok(()) => true,
			Err(err) => {
				warn!("Cannot set token on session '{alias}': {err}");
				false
			}
		}
	}

	fn emit_token_refresh(&self, alias: &str, success: bool) {
		self.events.dispatch(RelayEvent::TokenRefresh(TokenRefreshEvent {
			alias: alias.to_string(),
			success,
			timestamp: chrono::Utc::now(),
		}));
	}

	/// One transport round trip, normalized.
	async fn send_once(&self, call: &Call) -> RelayResult<Envelope> {
		let timeout = call.transport.timeout.unwrap_or_else(|| self.global_timeout());
		if !call.transport.extra.is_empty() {
			debug!(
				"Ignoring unsupported request parameters: {:?}",
				call.transport.extra.keys().collect::<Vec<_>>()
			);
		}

		match &call.target {
			Target::Session { alias, endpoint } => {
				let Some(session) = self.sessions.get(alias) else {
					warn!("Session '{alias}' not found!");
					return Err(RelayError::SessionNotFound(alias.clone()));
				};
				let url = join_endpoint(session.base_url(), endpoint).map_err(|err| {
					RelayError::InvalidUrl {
						url: format!("{}{endpoint}", session.base_url()),
						reason: err.to_string(),
					}
				})?;
				let request = build_request(call, url, timeout);
				self.exchange(alias.clone(), Some(session.connection()), request)
					.await
			}
			Target::Direct(raw) => {
				let url = Url::parse(raw).map_err(|err| RelayError::InvalidUrl {
					url: raw.clone(),
					reason: err.to_string(),
				})?;
				let request = build_request(call, url, timeout);
				self.exchange(self.label(&call.target), None, request).await
			}
		}
	}

	async fn exchange(
		&self,
		target: String,
		connection: Option<&Arc<dyn Connection>>,
		request: TransportRequest,
	) -> RelayResult<Envelope> {
		let method = request.method.clone();
		let url = request.url.to_string();
		self.events.dispatch(RelayEvent::Request(RequestEvent {
			target: target.clone(),
			method: method.clone(),
			url: url.clone(),
			timestamp: chrono::Utc::now(),
		}));

		let outcome = match connection {
			Some(connection) => connection.send(request).await,
			None => self.transport.send(request).await,
		};

		match outcome {
			Ok(raw) => {
				self.events.dispatch(RelayEvent::Response(ResponseEvent {
					target,
					method,
					url,
					status: raw.status,
					latency: raw.elapsed,
					content_type: raw.content_type().map(str::to_string),
					body: raw.body.clone(),
					timestamp: chrono::Utc::now(),
				}));
				Ok(self.responses.normalize(raw))
			}
			Err(err) => {
				self.events.dispatch(RelayEvent::Failure(FailureEvent {
					target,
					method,
					url,
					error: err.to_string(),
					timestamp: chrono::Utc::now(),
				}));
				Err(RelayError::Transport(err))
			}
		}
	}

	/// Metrics/log label: the alias, or the host of a direct URL.
	fn label(&self, target: &Target) -> String {
		match target {
			Target::Session { alias, .. } => alias.clone(),
			Target::Direct(raw) => Url::parse(raw)
				.ok()
				.and_then(|url| url.host_str().map(str::to_string))
				.unwrap_or_else(|| DIRECT_TARGET.to_string()),
		}
	}

	fn describe(&self, target: &Target) -> String {
		match target {
			Target::Session { alias, endpoint } => match self.sessions.url(alias) {
				Some(base) => format!("{base}{endpoint}"),
				None => format!("{alias}:{endpoint}"),
			},
			Target::Direct(raw) => raw.clone(),
		}
	}
}

fn build_request(call: &Call, url: Url, timeout: Duration) -> TransportRequest {
	let mut request = TransportRequest::new(call.method.clone(), url);
	request.headers = call.transport.headers.clone();
	request.query = call.transport.query.clone();
	request.body = call.transport.body.clone();
	request.timeout = Some(timeout);
	request
}

fn authorization_value(value: &str) -> RelayResult<HeaderValue> {
	HeaderValue::from_str(value)
		.map_err(|err| RelayError::InvalidHeader(format!("Authorization: {err}")))
}

pub(crate) fn lenient(outcome: RelayResult<Envelope>) -> Option<Envelope> {
	match outcome {
		Ok(envelope) => Some(envelope),
		Err(err) => {
			error!("Request failed: {err}");
			None
		}
	}
}
