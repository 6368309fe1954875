//! Request dispatch.
//!
//! ```text
//! Bot::send_files(method, files, params)
//!   ├─ files::split_files()            // file ids / URLs become string params
//!   ├─ no uploads left ──► Bot::raw()  // JSON POST, no multipart cost
//!   └─ uploads
//!        ├─ multipart::encode()        // writer task streams the body
//!        ├─ Transport::post()          // HTTP client reads the body concurrently
//!        ├─ HTTP 500 ──► Error::InternalServer
//!        └─ envelope::extract()
//! ```

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::envelope;
use crate::errors::{Error, Result};
use crate::files::{Files, Params, split_files};
use crate::multipart::{self, MultipartBody};
use crate::transport::{RequestBody, ReqwestTransport, Transport};

const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Client for one bot account.
///
/// Cheap to clone; clones share the underlying HTTP client.
#[derive(Clone)]
pub struct Bot {
    transport: Arc<dyn Transport>,
    base_url: String,
    token: String,
    verbose: bool,
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("base_url", &self.base_url)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl Bot {
    /// Validate `config` and build a bot backed by reqwest.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a bot on top of any transport. The config is used as-is.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url().to_string(),
            token: config.token.clone(),
            verbose: config.verbose,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call any API method with a JSON payload.
    ///
    /// API errors are extracted from the response; on success the whole response body is
    /// returned for the caller to decode its `result`.
    #[tracing::instrument(skip_all, fields(method = %method))]
    pub async fn raw<P: Serialize + ?Sized>(&self, method: &str, payload: &P) -> Result<Bytes> {
        let body = Bytes::from(serde_json::to_vec(payload).map_err(Error::Encode)?);

        let response = self
            .transport
            .post(&self.method_url(method), "application/json", RequestBody::Bytes(body.clone()))
            .await?;

        if self.verbose {
            log_verbose(method, &body, &response.body);
        }

        envelope::extract(response.body)
    }

    /// Call an API method that takes file arguments.
    ///
    /// Files that are already on the server or reachable by URL are sent as plain parameters and
    /// the call goes through [`Bot::raw`]. Anything that needs uploading switches the call to a
    /// streamed multipart body.
    #[tracing::instrument(skip_all, fields(method = %method, files = files.len()))]
    pub async fn send_files(&self, method: &str, files: Files, mut params: Params) -> Result<Bytes> {
        let uploads = split_files(files, &mut params)?;

        if uploads.is_empty() {
            tracing::debug!("No uploads needed, sending as JSON");
            return self.raw(method, &params).await;
        }

        tracing::debug!(uploads = uploads.len(), params = params.len(), "Sending multipart request");

        let MultipartBody {
            content_type,
            stream,
            writer,
        } = multipart::encode(uploads, params);

        let response = match self
            .transport
            .post(&self.method_url(method), &content_type, RequestBody::Stream(stream))
            .await
        {
            Ok(response) => response,
            Err(err) => {
                // The body was dropped with the request, so the writer is done or cancelled.
                // Its own failure says more than the transport's view of it.
                return Err(match writer.await {
                    Ok(Err(io_err)) if !matches!(io_err.kind(), io::ErrorKind::Interrupted | io::ErrorKind::BrokenPipe) => {
                        tracing::warn!(error = %io_err, "Upload failed while encoding body");
                        Error::Io(io_err)
                    }
                    _ => err,
                });
            }
        };

        if response.status == STATUS_INTERNAL_SERVER_ERROR {
            tracing::warn!(status = response.status, "Server failed to process upload");
            return Err(Error::InternalServer);
        }

        envelope::extract(response.body)
    }
}

/// Log a request and its response for debugging. Never fails.
fn log_verbose(method: &str, request: &[u8], response: &[u8]) {
    tracing::info!(
        method = %method,
        "sent request\nParams: {}\nResponse: {}",
        pretty_params(request),
        pretty_json(response)
    );
}

/// Pretty-print a request payload, expanding parameters that hold stringified JSON.
fn pretty_params(request: &[u8]) -> String {
    let Ok(mut value) = serde_json::from_slice::<Value>(request) else {
        return String::from_utf8_lossy(request).into_owned();
    };

    if let Value::Object(map) = &mut value {
        for field in map.values_mut() {
            if let Value::String(s) = field
                && (s.starts_with('{') || s.starts_with('['))
                && let Ok(nested) = serde_json::from_str::<Value>(s)
            {
                *field = nested;
            }
        }
    }

    serde_json::to_string_pretty(&value).unwrap_or_else(|_| String::from_utf8_lossy(request).into_owned())
}

fn pretty_json(data: &[u8]) -> String {
    serde_json::from_slice::<Value>(data)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(data).into_owned())
}
