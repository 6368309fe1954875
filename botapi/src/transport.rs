//! HTTP transport abstraction.
//!
//! The dispatcher only ever issues `POST` requests with either an in-memory JSON body or a
//! streamed multipart body. The [`Transport`] trait captures exactly that, so dispatch logic can
//! be tested against [`MockTransport`](crate::test_utils::MockTransport) without a network.

use std::io;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::header::CONTENT_TYPE;

use crate::errors::Result;

/// A request body produced chunk by chunk. An `Err` item ends the body with a failure.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

pub enum RequestBody {
    Bytes(Bytes),
    Stream(BodyStream),
}

/// Response from an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Complete response body
    pub body: Bytes,
}

/// Trait for executing the API's POST requests.
///
/// Implementations must be safe to share between concurrent calls; no call-level locking is
/// done by the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and read the whole response.
    ///
    /// # Errors
    /// Returns an error if the connection fails, the request times out, or the body stream ends
    /// with an error.
    async fn post(&self, url: &str, content_type: &str, body: RequestBody) -> Result<HttpResponse>;
}

/// Production transport using reqwest.
///
/// Idle connections are never kept in the pool, so every call opens a fresh connection. Long
/// running bots would otherwise hold connections the server has already dropped.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).pool_max_idle_per_host(0).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client. Its pooling and timeout settings are used as-is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip_all, fields(content_type = %content_type))]
    async fn post(&self, url: &str, content_type: &str, body: RequestBody) -> Result<HttpResponse> {
        let body = match body {
            RequestBody::Bytes(bytes) => {
                tracing::trace!(body_len = bytes.len(), "Sending buffered body");
                reqwest::Body::from(bytes)
            }
            RequestBody::Stream(stream) => {
                tracing::trace!("Sending streamed body");
                reqwest::Body::wrap_stream(stream)
            }
        };

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "HTTP request failed");
                e
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(status = status, response_len = body.len(), "HTTP request completed");

        Ok(HttpResponse { status, body })
    }
}
