//! Scripted transport used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::Method;
use serde_json::Value;
use url::Url;

use super::{Connection, RawResponse, SessionProfile, Transport, TransportError, TransportRequest};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16),
    Json(u16, Value),
    Text(u16, &'static str),
    Fail,
}

#[derive(Debug, Clone)]
pub(crate) struct Sent {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub session: Option<String>,
}

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<Sent>>,
    binds: AtomicUsize,
}

impl Script {
    /// The final reply repeats once the script is exhausted.
    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or(Reply::Fail)
        }
    }

    fn answer(
        &self,
        session: Option<String>,
        mut headers: HeaderMap,
        request: TransportRequest,
    ) -> Result<RawResponse, TransportError> {
        headers.extend(request.headers);
        self.sent.lock().unwrap().push(Sent {
            method: request.method,
            url: request.url.clone(),
            headers,
            session,
        });

        let response = match self.next_reply() {
            Reply::Status(status) => RawResponse::new(status, request.url),
            Reply::Json(status, value) => RawResponse::new(status, request.url).with_json(&value),
            Reply::Text(status, text) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                RawResponse::new(status, request.url)
                    .with_headers(headers)
                    .with_body(text)
            }
            Reply::Fail => return Err(TransportError::Request("connection refused".into())),
        };
        Ok(response.with_elapsed(Duration::from_millis(5)))
    }
}

pub(crate) struct ScriptedTransport {
    script: Arc<Script>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let script = Script {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        };
        Arc::new(Self {
            script: Arc::new(script),
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.script.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.script.sent.lock().unwrap().len()
    }

    pub fn binds(&self) -> usize {
        self.script.binds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn bind(&self, profile: &SessionProfile) -> Result<Arc<dyn Connection>, TransportError> {
        self.script.binds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedConnection {
            script: self.script.clone(),
            alias: profile.alias.clone(),
            headers: profile.headers.clone(),
        }))
    }

    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        self.script.answer(None, HeaderMap::new(), request)
    }
}

struct ScriptedConnection {
    script: Arc<Script>,
    alias: String,
    headers: HeaderMap,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        self.script
            .answer(Some(self.alias.clone()), self.headers.clone(), request)
    }
}
