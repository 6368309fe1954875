//! File arguments and their classification.
//!
//! A file argument reaches the API in one of four ways. Files already stored remotely are sent as
//! their identifier, and files the server can fetch itself are sent as a URL. Both of those travel
//! as plain string parameters. Local paths and caller-supplied readers have to be uploaded, which
//! forces the call onto the multipart path.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::errors::{Error, Result};

/// Plain string parameters of one call, keyed by API field name.
pub type Params = HashMap<String, String>;

/// File-bearing parameters of one call, keyed by API field name.
pub type Files = HashMap<String, File>;

/// Byte source supplied by the caller. It is dropped once the call that consumed it finishes.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Where the bytes of a file come from.
pub enum FileSource {
    /// Identifier of a file already stored on the server
    FileId(String),
    /// URL the server downloads the file from
    Url(String),
    /// Path on the local filesystem, opened at upload time
    Local(PathBuf),
    /// Open byte stream
    Reader(BoxReader),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::FileId(id) => f.debug_tuple("FileId").field(id).finish(),
            FileSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            FileSource::Local(path) => f.debug_tuple("Local").field(path).finish(),
            FileSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// A file as the API describes it, plus the local-only ways of supplying one.
///
/// The constructors populate exactly one source. If several are set by hand, the first of
/// remote identifier, URL, local path, reader wins.
#[derive(Default, Serialize, Deserialize)]
pub struct File {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_id: String,
    #[serde(rename = "file_unique_id", default, skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Server-side path, usable with the file download endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(skip)]
    pub file_url: Option<String>,
    #[serde(skip)]
    pub file_local: Option<PathBuf>,
    #[serde(skip)]
    pub file_reader: Option<BoxReader>,
    /// Filename sent with uploads
    #[serde(skip)]
    pub file_name: Option<String>,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("file_id", &self.file_id)
            .field("unique_id", &self.unique_id)
            .field("file_size", &self.file_size)
            .field("file_path", &self.file_path)
            .field("file_url", &self.file_url)
            .field("file_local", &self.file_local)
            .field("file_reader", &self.file_reader.as_ref().map(|_| ".."))
            .field("file_name", &self.file_name)
            .finish()
    }
}

impl File {
    pub fn from_id(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Default::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            file_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn from_disk(path: impl Into<PathBuf>) -> Self {
        Self {
            file_local: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            file_reader: Some(Box::new(reader)),
            ..Default::default()
        }
    }

    /// In-memory content, uploaded under `file_name`.
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::from_reader(Cursor::new(content.into())).with_file_name(file_name)
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Whether the file is already stored on the server.
    pub fn in_cloud(&self) -> bool {
        !self.file_id.is_empty()
    }

    pub fn on_disk(&self) -> bool {
        self.file_local.is_some()
    }

    /// Pick the source to send, in precedence order.
    pub fn into_source(self) -> Option<FileSource> {
        if !self.file_id.is_empty() {
            Some(FileSource::FileId(self.file_id))
        } else if let Some(url) = self.file_url.filter(|u| !u.is_empty()) {
            Some(FileSource::Url(url))
        } else if let Some(path) = self.file_local {
            Some(FileSource::Local(path))
        } else {
            self.file_reader.map(FileSource::Reader)
        }
    }
}

impl From<FileSource> for File {
    fn from(source: FileSource) -> Self {
        match source {
            FileSource::FileId(id) => File::from_id(id),
            FileSource::Url(url) => File::from_url(url),
            FileSource::Local(path) => File::from_disk(path),
            FileSource::Reader(reader) => Self {
                file_reader: Some(reader),
                ..Default::default()
            },
        }
    }
}

/// Content that has to travel in a multipart body.
#[derive(Debug)]
pub struct Upload {
    /// Filename hint for the part header
    pub file_name: String,
    pub content: UploadContent,
}

pub enum UploadContent {
    /// Opened by the encoder and closed once streamed
    Local(PathBuf),
    Reader(BoxReader),
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadContent::Local(path) => f.debug_tuple("Local").field(path).finish(),
            UploadContent::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// How a single file argument is sent.
#[derive(Debug)]
pub enum Classified {
    /// Sent as a plain string parameter
    Param(String),
    /// Needs a multipart upload
    Upload(Upload),
}

/// Classify the file given for `field`.
pub fn classify(field: &str, file: File) -> Result<Classified> {
    let file_name = file.file_name.clone();

    match file.into_source() {
        Some(FileSource::FileId(id)) => Ok(Classified::Param(id)),
        Some(FileSource::Url(url)) => Ok(Classified::Param(url)),
        Some(FileSource::Local(path)) => {
            let file_name = file_name
                .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| field.to_string());
            Ok(Classified::Upload(Upload {
                file_name,
                content: UploadContent::Local(path),
            }))
        }
        Some(FileSource::Reader(reader)) => Ok(Classified::Upload(Upload {
            file_name: file_name.unwrap_or_else(|| field.to_string()),
            content: UploadContent::Reader(reader),
        })),
        None => Err(Error::MissingFile { field: field.to_string() }),
    }
}

/// Classify every file of a call. String-routed files are merged into `params`; the rest are
/// returned as uploads.
pub fn split_files(files: Files, params: &mut Params) -> Result<Vec<(String, Upload)>> {
    let mut uploads = Vec::new();

    for (field, file) in files {
        match classify(&field, file)? {
            Classified::Param(value) => {
                tracing::trace!(field = %field, "file sent as string parameter");
                params.insert(field, value);
            }
            Classified::Upload(upload) => {
                tracing::trace!(field = %field, file_name = %upload.file_name, "file needs upload");
                uploads.push((field, upload));
            }
        }
    }

    Ok(uploads)
}
