//! Response envelope handling.
//!
//! Every reply from the API is wrapped in the same JSON object:
//!
//! ```json
//! {"ok": false, "error_code": 429, "description": "Too Many Requests: retry after 5",
//!  "parameters": {"retry_after": 5}}
//! ```
//!
//! [`extract_ok`] decides success or failure from that envelope without knowing anything about
//! the `result` shape. Callers decode the payload afterwards with [`decode_result`].

use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::{ApiError, Error, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: Option<bool>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
    migrate_to_chat_id: Option<i64>,
}

/// Check the envelope of a raw response body.
///
/// Missing `ok` counts as success unless an `error_code` is present.
pub fn extract_ok(data: &[u8]) -> Result<()> {
    let envelope: Envelope = serde_json::from_slice(data).map_err(Error::Decode)?;

    let failed = envelope.ok == Some(false) || envelope.error_code.is_some();
    if !failed {
        return Ok(());
    }

    let code = envelope.error_code.unwrap_or_default();
    let description = envelope.description.unwrap_or_default();
    let mut err = ApiError::new(code, description);

    if let Some(params) = envelope.parameters {
        err.retry_after = params.retry_after;
        err.migrate_to_chat_id = params.migrate_to_chat_id;
    }
    if err.retry_after.is_none() {
        err.retry_after = retry_after_from_description(&err.description);
    }

    tracing::debug!(code = err.code, kind = ?err.kind, description = %err.description, "API returned an error");
    Err(Error::Api(err))
}

/// Run [`extract_ok`] and hand the body back on success.
pub fn extract(data: Bytes) -> Result<Bytes> {
    extract_ok(&data)?;
    Ok(data)
}

/// Decode the `result` field of a successful response body.
pub fn decode_result<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    #[derive(Deserialize)]
    struct Payload<T> {
        result: T,
    }

    serde_json::from_slice::<Payload<T>>(data).map(|p| p.result).map_err(Error::Decode)
}

/// Older servers only carry the delay in the text, e.g. "Too Many Requests: retry after 5".
fn retry_after_from_description(description: &str) -> Option<u64> {
    let (_, tail) = description.rsplit_once("retry after ")?;
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
