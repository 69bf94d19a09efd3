//! Poll-until-condition helpers.
//!
//! Each helper resends the request as a single attempt every `interval` until
//! the condition holds or `timeout` elapses. The retry loop never nests inside
//! a poll. At least one attempt is always made.

use std::time::Duration;

use log::{error, info, warn};
use serde_json::Value;
use tokio::time::{Instant, sleep};

use crate::api_relay::{ApiRelay, RelayError, RelayResult, lenient};
use crate::params::{ExpectedStatus, RequestSpec};
use crate::response::Envelope;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl ApiRelay {
	/// Polls until the status code matches `expected`.
	///
	/// On timeout the last envelope received is returned and an error logged.
	pub async fn wait_until_status(
		&self,
		request: RequestSpec,
		expected: impl Into<ExpectedStatus>,
		timeout: Duration,
		interval: Duration,
	) -> Option<Envelope> {
		lenient_poll(self.try_wait_until_status(request, expected, timeout, interval).await)
	}

	pub async fn try_wait_until_status(
		&self,
		request: RequestSpec,
		expected: impl Into<ExpectedStatus>,
		timeout: Duration,
		interval: Duration,
	) -> RelayResult<Envelope> {
		let expected = expected.into();
		let condition = format!("API status {expected}");
		self.poll(request, &condition, timeout, interval, |envelope| {
			let status = self.responses().status_code(envelope);
			let matched = status.is_some_and(|code| expected.matches(code));
			if !matched {
				info!("Waiting for API status {expected}, got {status:?}");
			}
			matched
		})
		.await
	}

	/// Polls until `predicate` accepts the envelope.
	pub async fn wait_until_response<F>(
		&self,
		request: RequestSpec,
		predicate: F,
		timeout: Duration,
		interval: Duration,
	) -> Option<Envelope>
	where
		F: FnMut(&Envelope) -> bool,
	{
		lenient_poll(self.try_wait_until_response(request, predicate, timeout, interval).await)
	}

	pub async fn try_wait_until_response<F>(
		&self,
		request: RequestSpec,
		mut predicate: F,
		timeout: Duration,
		interval: Duration,
	) -> RelayResult<Envelope>
	where
		F: FnMut(&Envelope) -> bool,
	{
		self.poll(request, "API response condition", timeout, interval, |envelope| {
			let matched = predicate(envelope);
			if !matched {
				info!("Waiting for API response to satisfy condition");
			}
			matched
		})
		.await
	}

	/// Polls until the JSON value at `path` equals `expected`.
	pub async fn wait_until_json_path_value(
		&self,
		request: RequestSpec,
		path: &str,
		expected: &Value,
		timeout: Duration,
		interval: Duration,
	) -> Option<Envelope> {
		lenient_poll(
			self.try_wait_until_json_path_value(request, path, expected, timeout, interval)
				.await,
		)
	}

	pub async fn try_wait_until_json_path_value(
		&self,
		request: RequestSpec,
		path: &str,
		expected: &Value,
		timeout: Duration,
		interval: Duration,
	) -> RelayResult<Envelope> {
		let condition = format!("{path} = {expected}");
		self.poll(request, &condition, timeout, interval, |envelope| {
			let actual = self.responses().extract_json(envelope, Some(path), Value::Null);
			let matched = &actual == expected;
			if !matched {
				info!("Waiting for {path} = {expected}, got {actual}");
			}
			matched
		})
		.await
	}

	async fn poll<F>(
		&self,
		mut request: RequestSpec,
		condition: &str,
		timeout: Duration,
		interval: Duration,
		mut accept: F,
	) -> RelayResult<Envelope>
	where
		F: FnMut(&Envelope) -> bool,
	{
		request.control.max_retries = Some(1);
		request.control.expected_status = None;

		let interval = interval.max(MIN_POLL_INTERVAL);
		let started = Instant::now();
		let deadline = started + timeout;
		let mut last = None;

		loop {
			match self.try_send(request.clone()).await {
				Ok(envelope) if accept(&envelope) => return Ok(envelope),
				Ok(envelope) => last = Some(envelope),
				Err(err) if err.is_malformed_call() => return Err(err),
				Err(err) => warn!("Error while waiting for {condition}: {err}"),
			}

			let now = Instant::now();
			if now >= deadline {
				break;
			}
			sleep(interval.min(deadline - now)).await;
			if Instant::now() >= deadline {
				break;
			}
		}

		let waited = started.elapsed();
		error!(
			"Timeout after {:.1} seconds waiting for {condition}",
			timeout.as_secs_f64()
		);
		Err(RelayError::Timeout {
			waited,
			condition: condition.to_string(),
			last: last.map(Box::new),
		})
	}
}

fn lenient_poll(outcome: RelayResult<Envelope>) -> Option<Envelope> {
	match outcome {
		Err(RelayError::Timeout { last, .. }) => last.map(|envelope| *envelope),
		other => lenient(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	use http::HeaderMap;
	use serde_json::json;

	use crate::core::SessionOptions;
	use crate::core::testing::{Reply, ScriptedTransport};

	fn relay(transport: &Arc<ScriptedTransport>) -> ApiRelay {
		let relay = ApiRelay::builder()
			.with_transport(transport.clone())
			.disable_auto_log()
			.build()
			.unwrap();
		relay
			.sessions()
			.create("jobs", "https://jobs.example.com", HeaderMap::new(), SessionOptions::default())
			.unwrap();
		relay
	}

	fn job() -> RequestSpec {
		RequestSpec::get()
			.session("jobs", "/job/7")
			.max_retries(5)
			.expected_status(200)
	}

	#[tokio::test(start_paused = true)]
	async fn status_poll_returns_first_match_as_single_attempts() {
		let transport = ScriptedTransport::new([Reply::Status(202), Reply::Status(202), Reply::Status(200)]);
		let relay = relay(&transport);

		let started = Instant::now();
		let envelope = relay
			.wait_until_status(job(), 200, Duration::from_secs(10), Duration::from_millis(500))
			.await
			.unwrap();

		assert_eq!(relay.responses().status_code(&envelope), Some(200));
		assert_eq!(transport.send_count(), 3);
		let waited = started.elapsed();
		assert!(waited >= Duration::from_secs(1) && waited < Duration::from_millis(1100));
	}

	#[tokio::test(start_paused = true)]
	async fn status_poll_timeout_returns_last_envelope() {
		let transport = ScriptedTransport::new([Reply::Status(202)]);
		let relay = relay(&transport);

		let started = Instant::now();
		let envelope = relay
			.wait_until_status(job(), 200, Duration::from_secs(1), Duration::from_secs(1))
			.await
			.unwrap();

		assert_eq!(relay.responses().status_code(&envelope), Some(202));
		let waited = started.elapsed();
		assert!(waited >= Duration::from_secs(1) && waited < Duration::from_millis(1100));
		assert_eq!(transport.send_count(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn strict_poll_reports_timeout() {
		let transport = ScriptedTransport::new([Reply::Status(202)]);
		let relay = relay(&transport);

		let err = relay
			.try_wait_until_status(job(), [200, 204], Duration::from_secs(2), Duration::from_millis(700))
			.await
			.unwrap_err();

		match err {
			RelayError::Timeout { waited, condition, last } => {
				assert!(waited >= Duration::from_secs(2) && waited < Duration::from_millis(2100));
				assert_eq!(condition, "API status [200, 204]");
				assert_eq!(last.and_then(|envelope| envelope.status_code()), Some(202));
			}
			other => panic!("expected timeout, got {other}"),
		}
		assert_eq!(transport.send_count(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn transport_errors_keep_polling() {
		let transport = ScriptedTransport::new([Reply::Fail, Reply::Status(200)]);
		let relay = relay(&transport);

		let envelope = relay
			.wait_until_status(job(), 200, Duration::from_secs(5), Duration::from_millis(100))
			.await
			.unwrap();
		assert_eq!(relay.responses().status_code(&envelope), Some(200));
		assert_eq!(transport.send_count(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn json_path_poll_waits_for_value() {
		let transport = ScriptedTransport::new([
			Reply::Json(200, json!({"job": {"state": "running"}})),
			Reply::Json(200, json!({"job": {"state": "done"}})),
		]);
		let relay = relay(&transport);

		let envelope = relay
			.wait_until_json_path_value(
				job(),
				"job.state",
				&json!("done"),
				Duration::from_secs(5),
				Duration::from_millis(200),
			)
			.await
			.unwrap();
		assert_eq!(envelope.json_value("job.state"), Some(json!("done")));
		assert_eq!(transport.send_count(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn predicate_poll_and_malformed_calls() {
		let transport = ScriptedTransport::new([
			Reply::Json(200, json!({"items": []})),
			Reply::Json(200, json!({"items": [1]})),
		]);
		let relay = relay(&transport);

		let envelope = relay
			.wait_until_response(
				job(),
				|envelope| {
					envelope
						.json_value("items")
						.and_then(|items| items.as_array().map(|items| !items.is_empty()))
						.unwrap_or(false)
				},
				Duration::from_secs(5),
				Duration::from_millis(50),
			)
			.await;
		assert!(envelope.is_some());

		let err = relay
			.try_wait_until_status(
				RequestSpec::get().session("ghost", "/"),
				200,
				Duration::from_secs(5),
				Duration::from_millis(50),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, RelayError::SessionNotFound(_)));
	}
}
