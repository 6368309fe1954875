use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Connection failure, timeout or a broken request/response stream
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local I/O failure while producing a request body
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body is not a valid envelope (or result) for the call
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Request payload could not be serialized
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The remote API reported a failure in its envelope
    #[error(transparent)]
    Api(#[from] ApiError),

    /// HTTP 500 on a multipart call, returned without looking at the body
    #[error("internal server error")]
    InternalServer,

    /// A file reference with no source populated
    #[error("file for field {field} doesn't exist")]
    MissingFile { field: String },

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The API error kind, if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(api) => Some(api.kind),
            _ => None,
        }
    }
}

/// A failure reported by the remote API envelope.
///
/// `code` and `description` are always the values the server sent, whatever kind the
/// description was mapped to.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("api error {code}: {description}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub code: i64,
    pub description: String,
    /// Seconds to wait before retrying, for rate-limited calls
    pub retry_after: Option<u64>,
    /// New supergroup id when a group was migrated
    pub migrate_to_chat_id: Option<i64>,
}

impl ApiError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        let description = description.into();
        let kind = ApiErrorKind::from_description(code, &description);
        Self {
            kind,
            code,
            description,
            retry_after: None,
            migrate_to_chat_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    TooManyRequests,
    Unauthorized,
    BlockedByUser,
    UserDeactivated,
    Forbidden,
    ChatNotFound,
    UserNotFound,
    MessageNotModified,
    MessageToEditNotFound,
    MessageToDeleteNotFound,
    WrongFileId,
    EmptyMessage,
    StickerSetInvalid,
    StickerSetNameOccupied,
    GroupMigrated,
    NotFound,
    InternalServer,
    /// Description did not match any known category
    Unknown,
}

/// Description substrings and the kind they map to. First match wins, so more specific
/// phrases sit above the generic ones they contain.
static DESCRIPTION_KINDS: &[(&str, ApiErrorKind)] = &[
    ("Too Many Requests", ApiErrorKind::TooManyRequests),
    ("Unauthorized", ApiErrorKind::Unauthorized),
    ("bot was blocked by the user", ApiErrorKind::BlockedByUser),
    ("user is deactivated", ApiErrorKind::UserDeactivated),
    ("Forbidden", ApiErrorKind::Forbidden),
    ("chat not found", ApiErrorKind::ChatNotFound),
    ("user not found", ApiErrorKind::UserNotFound),
    ("message is not modified", ApiErrorKind::MessageNotModified),
    ("message to edit not found", ApiErrorKind::MessageToEditNotFound),
    ("message to delete not found", ApiErrorKind::MessageToDeleteNotFound),
    ("wrong file identifier", ApiErrorKind::WrongFileId),
    ("message text is empty", ApiErrorKind::EmptyMessage),
    ("STICKERSET_INVALID", ApiErrorKind::StickerSetInvalid),
    ("sticker set name is already occupied", ApiErrorKind::StickerSetNameOccupied),
    ("group chat was upgraded to a supergroup", ApiErrorKind::GroupMigrated),
    ("Not Found", ApiErrorKind::NotFound),
    ("Internal Server Error", ApiErrorKind::InternalServer),
];

impl ApiErrorKind {
    /// Map an error description to a known kind.
    pub fn from_description(code: i64, description: &str) -> Self {
        DESCRIPTION_KINDS
            .iter()
            .find(|(needle, _)| description.contains(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(match code {
                429 => ApiErrorKind::TooManyRequests,
                _ => ApiErrorKind::Unknown,
            })
    }
}

/// Type alias for dispatch results
pub type Result<T> = std::result::Result<T, Error>;
