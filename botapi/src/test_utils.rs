//! Test utilities (available with the `test-utils` feature).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use parking_lot::Mutex;
use url::Url;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::transport::{HttpResponse, RequestBody, Transport};

/// Config pointing at a host that is never contacted.
pub fn test_config() -> Config {
    Config::new(Url::parse("http://bot.test").expect("valid test URL"), "123:secret")
}

/// Mock transport for testing.
///
/// Responses are queued per API method (the last URL segment) and returned in FIFO order.
/// Streamed bodies are read to the end, so every recorded call holds the complete body the
/// HTTP client would have sent.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<HttpResponse>>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Record of a call made to the mock transport.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub url: String,
    pub method: String,
    pub content_type: String,
    pub body: Bytes,
    /// Whether the body arrived as a stream rather than a buffer
    pub streamed: bool,
    /// Error that ended a streamed body early
    pub body_error: Option<String>,
    /// Number of chunks a streamed body arrived in
    pub chunks: usize,
}

impl MockCall {
    /// Body parsed as JSON. Panics if it isn't.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for an API method.
    pub fn add_response(&self, method: &str, response: Result<HttpResponse>) {
        self.responses.lock().entry(method.to_string()).or_default().push_back(response);
    }

    /// Queue a JSON response for an API method.
    pub fn respond_json(&self, method: &str, status: u16, body: serde_json::Value) {
        self.add_response(
            method,
            Ok(HttpResponse {
                status,
                body: Bytes::from(body.to_string()),
            }),
        );
    }

    /// Get all calls that have been made to this mock transport.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, url: &str, content_type: &str, body: RequestBody) -> Result<HttpResponse> {
        let method = url.rsplit('/').next().unwrap_or_default().to_string();

        let mut call = MockCall {
            url: url.to_string(),
            method: method.clone(),
            content_type: content_type.to_string(),
            body: Bytes::new(),
            streamed: false,
            body_error: None,
            chunks: 0,
        };

        let mut failure = None;
        match body {
            RequestBody::Bytes(bytes) => call.body = bytes,
            RequestBody::Stream(mut stream) => {
                call.streamed = true;
                let mut buf = BytesMut::new();
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(chunk) => {
                            call.chunks += 1;
                            buf.extend_from_slice(&chunk);
                        }
                        Err(e) => {
                            call.body_error = Some(e.to_string());
                            failure = Some(e);
                            break;
                        }
                    }
                }
                call.body = buf.freeze();
            }
        }

        self.calls.lock().push(call);

        if let Some(e) = failure {
            return Err(Error::Io(e));
        }

        let queued = self.responses.lock().get_mut(&method).and_then(VecDeque::pop_front);
        queued.unwrap_or_else(|| Err(Error::Io(std::io::Error::other(format!("No mock response configured for {method}")))))
    }
}
