use std::time::Duration;

use crate::dispatch::Bot;
use crate::envelope::decode_result;
use crate::errors::{Error, Result};
use crate::files::{File, Files, Params};
use crate::types::{Message, Recipient, Update, User};

/// Optional parameters shared by the send methods.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub reply_to: Option<i64>,
    pub parse_mode: Option<String>,
    pub disable_notification: bool,
    pub disable_web_page_preview: bool,
    /// Keyboard or other markup, already serialized as JSON
    pub reply_markup: Option<String>,
}

impl SendOptions {
    fn embed(&self, params: &mut Params) {
        if let Some(id) = self.reply_to {
            params.insert("reply_to_message_id".to_string(), id.to_string());
        }
        if let Some(mode) = &self.parse_mode {
            params.insert("parse_mode".to_string(), mode.clone());
        }
        if self.disable_notification {
            params.insert("disable_notification".to_string(), "true".to_string());
        }
        if self.disable_web_page_preview {
            params.insert("disable_web_page_preview".to_string(), "true".to_string());
        }
        if let Some(markup) = &self.reply_markup {
            params.insert("reply_markup".to_string(), markup.clone());
        }
    }
}

/// Kinds of media with their own send method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Audio,
    Document,
    Video,
    Animation,
    Voice,
    VideoNote,
    Sticker,
}

impl MediaKind {
    /// API method used to send this kind.
    pub fn method(self) -> &'static str {
        match self {
            MediaKind::Photo => "sendPhoto",
            MediaKind::Audio => "sendAudio",
            MediaKind::Document => "sendDocument",
            MediaKind::Video => "sendVideo",
            MediaKind::Animation => "sendAnimation",
            MediaKind::Voice => "sendVoice",
            MediaKind::VideoNote => "sendVideoNote",
            MediaKind::Sticker => "sendSticker",
        }
    }

    /// Parameter that carries the file.
    pub fn field(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
            MediaKind::Video => "video",
            MediaKind::Animation => "animation",
            MediaKind::Voice => "voice",
            MediaKind::VideoNote => "video_note",
            MediaKind::Sticker => "sticker",
        }
    }
}

impl Bot {
    /// Basic information about the bot itself.
    pub async fn get_me(&self) -> Result<User> {
        let data = self.raw("getMe", &Params::new()).await?;
        decode_result(&data)
    }

    /// One `getUpdates` call. Polling is left to the caller.
    pub async fn get_updates(&self, offset: i64, limit: u32, timeout: Duration, allowed: &[&str]) -> Result<Vec<Update>> {
        let mut params = Params::from([
            ("offset".to_string(), offset.to_string()),
            ("timeout".to_string(), timeout.as_secs().to_string()),
        ]);

        if limit != 0 {
            params.insert("limit".to_string(), limit.to_string());
        }
        if !allowed.is_empty() {
            let encoded = serde_json::to_string(allowed).map_err(Error::Encode)?;
            params.insert("allowed_updates".to_string(), encoded);
        }

        let data = self.raw("getUpdates", &params).await?;
        decode_result(&data)
    }

    pub async fn send_text<R: Recipient + ?Sized>(&self, to: &R, text: &str, opts: Option<&SendOptions>) -> Result<Message> {
        let mut params = Params::from([("chat_id".to_string(), to.recipient()), ("text".to_string(), text.to_string())]);
        if let Some(opts) = opts {
            opts.embed(&mut params);
        }

        let data = self.raw("sendMessage", &params).await?;
        decode_result(&data)
    }

    /// Send a media file, plus any extra files the method accepts (a `thumb`, for instance).
    pub async fn send_media<R: Recipient + ?Sized>(
        &self,
        to: &R,
        kind: MediaKind,
        file: File,
        mut params: Params,
        extra: Files,
        opts: Option<&SendOptions>,
    ) -> Result<Message> {
        params.insert("chat_id".to_string(), to.recipient());
        if let Some(opts) = opts {
            opts.embed(&mut params);
        }

        let mut files = extra;
        files.insert(kind.field().to_string(), file);

        let data = self.send_files(kind.method(), files, params).await?;
        decode_result(&data)
    }
}
