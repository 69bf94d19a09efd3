//! End-to-end calls through the reqwest transport against a mock server.

use std::time::Duration;

use api_relay::{ApiRelay, RequestSpec, SessionOptions};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use httpmock::prelude::*;
use serde_json::json;

fn relay(token_endpoint: Option<String>) -> ApiRelay {
    let mut builder = ApiRelay::builder().disable_auto_log();
    if let Some(endpoint) = token_endpoint {
        builder = builder.with_token_endpoint(endpoint);
    }
    builder.build().unwrap()
}

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for &(name, value) in pairs {
        map.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    map
}

#[tokio::test]
async fn session_call_carries_headers_query_and_json_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/items")
            .header("x-team", "qa")
            .query_param("page", "2")
            .json_body(json!({"name": "widget"}));
        then.status(201).json_body(json!({"id": 7}));
    });

    let relay = relay(None);
    relay
        .sessions()
        .create("api", server.base_url(), headers(&[("x-team", "qa")]), SessionOptions::default())
        .unwrap();

    let envelope = relay
        .try_send(
            RequestSpec::post()
                .session("api", "/v1/items")
                .query("page", "2")
                .json(json!({"name": "widget"}))
                .expected_status(201),
        )
        .await
        .unwrap();

    assert_eq!(relay.responses().status_code(&envelope), Some(201));
    assert_eq!(envelope.json_value("id"), Some(json!(7)));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn session_keeps_cookies_between_calls() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/login");
        then.status(204).header("set-cookie", "sid=abc123; Path=/");
    });
    let profile = server.mock(|when, then| {
        when.method(GET).path("/me").header("cookie", "sid=abc123");
        then.status(200).json_body(json!({"user": "qa"}));
    });

    let relay = relay(None);
    relay
        .sessions()
        .create("web", server.base_url(), HeaderMap::new(), SessionOptions::default())
        .unwrap();

    relay
        .try_send(RequestSpec::get().session("web", "/login").max_retries(1))
        .await
        .unwrap();
    let details = relay.sessions().details("web").unwrap();
    assert_eq!(details.cookies.get("sid").map(String::as_str), Some("abc123"));

    let envelope = relay
        .try_send(RequestSpec::get().session("web", "/me").max_retries(1))
        .await
        .unwrap();
    assert_eq!(envelope.json_value("user"), Some(json!("qa")));
    assert_eq!(profile.calls(), 1);
}

#[tokio::test]
async fn expired_token_is_refreshed_before_a_final_attempt() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method(GET)
            .path("/secure")
            .header("authorization", "Bearer stale");
        then.status(401);
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/secure")
            .header("authorization", "Bearer fresh");
        then.status(200).json_body(json!({"ok": true}));
    });
    let auth = server.mock(|when, then| {
        when.method(POST).path("/auth").header("refreshtoken", "stale");
        then.status(200).json_body(json!({
            "auth_token": "fresh",
            "auth_expires_at": "2030-01-01T00:00:00Z"
        }));
    });

    let relay = relay(Some(server.url("/auth")));
    relay
        .sessions()
        .create(
            "api",
            server.base_url(),
            headers(&[("authorization", "Bearer stale")]),
            SessionOptions::default(),
        )
        .unwrap();

    let envelope = relay
        .try_send(
            RequestSpec::get()
                .session("api", "/secure")
                .max_retries(2)
                .delay(Duration::from_millis(10))
                .expected_status(200)
                .token_check_on_failure(true),
        )
        .await
        .unwrap();

    assert_eq!(relay.responses().status_code(&envelope), Some(200));
    assert_eq!(rejected.calls(), 2);
    assert_eq!(accepted.calls(), 1);
    assert_eq!(auth.calls(), 1);
    assert_eq!(
        relay.sessions().headers("api").unwrap().get("authorization").unwrap(),
        "Bearer fresh"
    );
}

#[tokio::test]
async fn plain_text_responses_stay_wrapped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200).header("content-type", "text/plain").body("up");
    });

    let relay = relay(None);
    let envelope = relay
        .try_send(RequestSpec::get().url(server.url("/health")).max_retries(1))
        .await
        .unwrap();

    let wrapper = envelope.as_wrapper().unwrap();
    assert_eq!(wrapper.text(), "up");
    assert!(wrapper.ok());
    assert_eq!(relay.responses().status_code(&envelope), Some(200));
}
