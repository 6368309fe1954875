//! Entities returned by the wrapped endpoints.
//!
//! Only the fields the wrappers in [`methods`](crate::methods) need are modelled; unknown fields
//! in responses are ignored.

use serde::{Deserialize, Serialize};

use crate::files::File;

/// Anything a message can be addressed to.
pub trait Recipient {
    /// Chat id or `@username`, as the API expects it in `chat_id`/`user_id`.
    fn recipient(&self) -> String;
}

impl Recipient for i64 {
    fn recipient(&self) -> String {
        self.to_string()
    }
}

impl Recipient for str {
    fn recipient(&self) -> String {
        self.to_string()
    }
}

impl Recipient for String {
    fn recipient(&self) -> String {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl Recipient for User {
    fn recipient(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Recipient for Chat {
    fn recipient(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: i64,
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub document: Option<File>,
    #[serde(default)]
    pub photo: Vec<Photo>,
    #[serde(default)]
    pub sticker: Option<Sticker>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(rename = "update_id")]
    pub id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    #[serde(flatten)]
    pub file: File,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct Sticker {
    #[serde(flatten)]
    pub file: File,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_animated: bool,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub mask_position: Option<MaskPosition>,
}

#[derive(Debug, Deserialize)]
pub struct StickerSet {
    pub name: String,
    pub title: String,
    #[serde(rename = "is_animated", default)]
    pub animated: bool,
    #[serde(default)]
    pub contains_masks: bool,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    #[serde(rename = "thumb", default)]
    pub thumbnail: Option<Photo>,
}

/// Where on a face a mask sticker is placed by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPosition {
    #[serde(rename = "point")]
    pub feature: MaskFeature,
    pub x_shift: f32,
    pub y_shift: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFeature {
    Forehead,
    Eyes,
    Mouth,
    Chin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sticker_set_decodes() {
        let set: StickerSet = serde_json::from_str(
            r#"{
                "name": "cats_by_bot",
                "title": "Cats",
                "is_animated": false,
                "contains_masks": true,
                "stickers": [{
                    "file_id": "CAAC",
                    "file_unique_id": "AgAD",
                    "width": 512,
                    "height": 512,
                    "emoji": "🐱",
                    "mask_position": {"point": "eyes", "x_shift": -1.0, "y_shift": 1.0, "scale": 2.0}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(set.name, "cats_by_bot");
        assert!(set.contains_masks);
        assert_eq!(set.stickers.len(), 1);
        let sticker = &set.stickers[0];
        assert_eq!(sticker.file.file_id, "CAAC");
        assert_eq!(sticker.mask_position.as_ref().unwrap().feature, MaskFeature::Eyes);
    }

    #[test]
    fn test_mask_position_encodes_with_api_names() {
        let pos = MaskPosition {
            feature: MaskFeature::Forehead,
            x_shift: 0.5,
            y_shift: 0.0,
            scale: 1.0,
        };
        let json = serde_json::to_value(&pos).unwrap();
        assert_eq!(json["point"], "forehead");
        assert_eq!(json["x_shift"], 0.5);
    }

    #[test]
    fn test_recipients() {
        assert_eq!(42i64.recipient(), "42");
        assert_eq!("@channel".recipient(), "@channel");
    }
}
