//! # botapi: client for a bot messaging platform's HTTP API
//!
//! `botapi` turns typed method calls into `POST <url>/bot<token>/<method>` requests and turns
//! the JSON envelope that comes back into typed results or errors.
//!
//! ## Request flow
//!
//! Most calls carry only strings and go out as a JSON body through [`Bot::raw`]. Calls with file
//! arguments go through [`Bot::send_files`], which first classifies every file
//! ([`files::classify`]). Files already on the server and files the server can fetch by URL are
//! plain string parameters, so if nothing needs uploading the call still goes out as JSON.
//! Otherwise the parameters and file contents are written into a `multipart/form-data` body by a
//! background task ([`multipart::encode`]) while the HTTP client sends it. The two sides are
//! joined by a bounded channel, so memory use does not grow with file size.
//!
//! Every response body passes through [`envelope::extract_ok`]. API failures become
//! [`errors::ApiError`] values whose [`ApiErrorKind`] is looked up from the error description.
//!
//! ## Example
//!
//! ```no_run
//! use botapi::{Bot, Config, File};
//!
//! # async fn run() -> botapi::Result<()> {
//! let config = Config::new("https://api.telegram.org".parse().unwrap(), "123456:ABC-DEF");
//! let bot = Bot::new(&config)?;
//!
//! let me = bot.get_me().await?;
//! let sticker = bot.upload_sticker(&me, File::from_disk("cat.png")).await?;
//! println!("uploaded as {}", sticker.file_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors and retries
//!
//! Nothing is retried here. A rate-limited call fails with
//! [`ApiErrorKind::TooManyRequests`] and carries `retry_after`; what to do with it is up to the
//! caller.

pub mod config;
mod dispatch;
pub mod envelope;
pub mod errors;
pub mod files;
pub mod methods;
pub mod multipart;
pub mod telemetry;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use dispatch::Bot;
pub use errors::{ApiError, ApiErrorKind, Error, Result};
pub use files::{File, FileSource, Files, Params};
pub use methods::{MediaKind, NewSticker, SendOptions};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
