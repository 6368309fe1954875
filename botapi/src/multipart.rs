//! Streaming `multipart/form-data` encoder.
//!
//! ```text
//! encode()
//!   ├─ spawn writer task ───────────────────────────────┐
//!   │                                                    ▼
//!   │        for each upload: part header, file chunks ─┐
//!   │        for each param:  part header, value ───────┤
//!   │        closing boundary ──────────────────────────┤
//!   │                                                    │ mpsc (PIPE_CAPACITY chunks)
//!   └─ MultipartBody.stream ◄────────────────────────────┘
//!          (read by the HTTP client while the writer is still running)
//! ```
//!
//! At most `PIPE_CAPACITY` chunks of at most `CHUNK_SIZE` bytes are buffered, plus the chunk the
//! writer is holding, whatever the size of the files. A failing writer sends a final `Err` item,
//! so the body ends with an error instead of looking complete. Dropping the stream cancels the
//! writer.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::files::{Params, Upload, UploadContent};
use crate::transport::BodyStream;

/// Largest chunk read from a file in one go.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the writer task and the HTTP client.
pub const PIPE_CAPACITY: usize = 4;

/// A multipart body being produced by a background writer.
pub struct MultipartBody {
    /// `multipart/form-data; boundary=...`
    pub content_type: String,
    pub stream: BodyStream,
    /// Resolves once the writer finishes, with the error that ended the body if any
    pub writer: JoinHandle<io::Result<()>>,
}

/// Start encoding `uploads` as file parts followed by `params` as plain fields.
///
/// Must be called inside a tokio runtime.
pub fn encode(uploads: Vec<(String, Upload)>, params: Params) -> MultipartBody {
    let boundary = Uuid::new_v4().simple().to_string();
    let content_type = format!("multipart/form-data; boundary={boundary}");

    let (tx, rx) = mpsc::channel(PIPE_CAPACITY);
    let token = CancellationToken::new();
    let params: Vec<(String, String)> = params.into_iter().collect();

    let writer = PipeWriter { tx };
    let cancelled = token.clone();
    let handle = tokio::spawn(async move {
        let result = tokio::select! {
            res = write_body(&writer, &boundary, uploads, params) => res,
            _ = cancelled.cancelled() => Err(io::Error::new(io::ErrorKind::Interrupted, "multipart upload cancelled")),
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Multipart encoding failed");
            writer.close_with_error(io::Error::new(e.kind(), e.to_string())).await;
        }
        result
    });

    MultipartBody {
        content_type,
        stream: Box::pin(PipeReader {
            inner: ReceiverStream::new(rx),
            _cancel: token.drop_guard(),
        }),
        writer: handle,
    }
}

/// Write end of the body pipe. Dropping it ends the body normally.
struct PipeWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl PipeWriter {
    async fn write(&self, chunk: impl Into<Bytes>) -> io::Result<()> {
        self.tx
            .send(Ok(chunk.into()))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "multipart body consumer went away"))
    }

    async fn close_with_error(&self, err: io::Error) {
        // Nobody left to tell if the consumer is gone
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Read end of the body pipe. Cancels the writer when dropped.
struct PipeReader {
    inner: ReceiverStream<io::Result<Bytes>>,
    _cancel: DropGuard,
}

impl Stream for PipeReader {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

async fn write_body(writer: &PipeWriter, boundary: &str, uploads: Vec<(String, Upload)>, params: Vec<(String, String)>) -> io::Result<()> {
    let mut first = true;

    for (field, upload) in uploads {
        writer.write(part_header(boundary, first, &field, Some(&upload.file_name))).await?;
        first = false;

        match upload.content {
            UploadContent::Local(path) => {
                let file = open_local(&path).await?;
                copy_chunks(writer, file).await?;
                // file handle released here
            }
            UploadContent::Reader(reader) => copy_chunks(writer, reader).await?,
        }
        tracing::trace!(field = %field, "Wrote file part");
    }

    for (field, value) in params {
        writer.write(part_header(boundary, first, &field, None)).await?;
        first = false;
        writer.write(value).await?;
    }

    let closing = if first {
        format!("--{boundary}--\r\n")
    } else {
        format!("\r\n--{boundary}--\r\n")
    };
    writer.write(closing).await
}

async fn open_local(path: &Path) -> io::Result<tokio::fs::File> {
    tokio::fs::File::open(path)
        .await
        .map_err(|e| io::Error::new(e.kind(), format!("failed to open {}: {e}", path.display())))
}

async fn copy_chunks(writer: &PipeWriter, mut reader: impl AsyncRead + Unpin) -> io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
    }
}

fn part_header(boundary: &str, first: bool, field: &str, file_name: Option<&str>) -> String {
    let mut header = String::new();
    if !first {
        header.push_str("\r\n");
    }
    header.push_str(&format!("--{boundary}\r\n"));
    header.push_str(&format!("Content-Disposition: form-data; name=\"{}\"", escape_quotes(field)));
    match file_name {
        Some(name) => {
            header.push_str(&format!("; filename=\"{}\"\r\n", escape_quotes(name)));
            header.push_str("Content-Type: application/octet-stream\r\n\r\n");
        }
        None => header.push_str("\r\n\r\n"),
    }
    header
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
