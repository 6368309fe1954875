use crate::dispatch::Bot;
use crate::envelope::decode_result;
use crate::errors::{Error, Result};
use crate::files::{File, Files, Params};
use crate::types::{MaskPosition, Recipient, StickerSet};

/// A sticker set to create, or a sticker to add to an existing one.
///
/// Exactly one of `png` (static) or `tgs` (animated) should be set.
#[derive(Debug, Default)]
pub struct NewSticker {
    /// Set name, which must end in `_by_<bot username>`
    pub name: String,
    /// Set title, only used when creating the set
    pub title: String,
    pub emojis: String,
    pub png: Option<File>,
    pub tgs: Option<File>,
    pub contains_masks: bool,
    pub mask_position: Option<MaskPosition>,
}

impl NewSticker {
    fn mask_position_param(&self, params: &mut Params) -> Result<()> {
        if let Some(pos) = &self.mask_position {
            let encoded = serde_json::to_string(pos).map_err(Error::Encode)?;
            params.insert("mask_position".to_string(), encoded);
        }
        Ok(())
    }
}

impl Bot {
    /// Upload a PNG for later use in sticker sets. Returns the stored file.
    pub async fn upload_sticker<R: Recipient + ?Sized>(&self, to: &R, png: File) -> Result<File> {
        let files = Files::from([("png_sticker".to_string(), png)]);
        let params = Params::from([("user_id".to_string(), to.recipient())]);

        let data = self.send_files("uploadStickerFile", files, params).await?;
        decode_result(&data)
    }

    pub async fn sticker_set(&self, name: &str) -> Result<StickerSet> {
        let data = self.raw("getStickerSet", &Params::from([("name".to_string(), name.to_string())])).await?;
        decode_result(&data)
    }

    pub async fn create_sticker_set<R: Recipient + ?Sized>(&self, to: &R, set: NewSticker) -> Result<()> {
        let mut params = Params::from([
            ("user_id".to_string(), to.recipient()),
            ("name".to_string(), set.name.clone()),
            ("title".to_string(), set.title.clone()),
            ("emojis".to_string(), set.emojis.clone()),
            ("contains_masks".to_string(), set.contains_masks.to_string()),
        ]);
        set.mask_position_param(&mut params)?;

        let mut files = Files::new();
        if let Some(png) = set.png {
            files.insert("png_sticker".to_string(), png);
        }
        if let Some(tgs) = set.tgs {
            files.insert("tgs_sticker".to_string(), tgs);
        }

        self.send_files("createNewStickerSet", files, params).await?;
        Ok(())
    }

    /// Add a sticker to an existing set. A PNG is preferred over a TGS when both are given.
    pub async fn add_sticker<R: Recipient + ?Sized>(&self, to: &R, sticker: NewSticker) -> Result<()> {
        let mut params = Params::from([
            ("user_id".to_string(), to.recipient()),
            ("name".to_string(), sticker.name.clone()),
            ("emojis".to_string(), sticker.emojis.clone()),
        ]);
        sticker.mask_position_param(&mut params)?;

        let mut files = Files::new();
        if let Some(png) = sticker.png {
            files.insert("png_sticker".to_string(), png);
        } else if let Some(tgs) = sticker.tgs {
            files.insert("tgs_sticker".to_string(), tgs);
        }

        self.send_files("addStickerToSet", files, params).await?;
        Ok(())
    }

    /// Move a sticker in its set to `position` (zero-based).
    pub async fn set_sticker_position(&self, sticker: &str, position: u32) -> Result<()> {
        let params = Params::from([
            ("sticker".to_string(), sticker.to_string()),
            ("position".to_string(), position.to_string()),
        ]);
        self.raw("setStickerPositionInSet", &params).await?;
        Ok(())
    }

    pub async fn delete_sticker(&self, sticker: &str) -> Result<()> {
        self.raw("deleteStickerFromSet", &Params::from([("sticker".to_string(), sticker.to_string())]))
            .await?;
        Ok(())
    }

    /// Set the thumbnail of a sticker set.
    ///
    /// Static thumbnails are PNGs of exactly 100x100 px up to 128 KB; animated sets take a TGS up
    /// to 32 KB, which cannot be given as a URL.
    pub async fn set_sticker_set_thumb<R: Recipient + ?Sized>(&self, to: &R, name: &str, thumb: File) -> Result<()> {
        let files = Files::from([("thumb".to_string(), thumb)]);
        let params = Params::from([("name".to_string(), name.to_string()), ("user_id".to_string(), to.recipient())]);

        self.send_files("setStickerSetThumb", files, params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorKind;
    use crate::test_utils::{MockTransport, test_config};
    use crate::types::MaskFeature;
    use serde_json::json;
    use std::sync::Arc;

    fn bot(mock: &MockTransport) -> Bot {
        Bot::with_transport(&test_config(), Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_upload_sticker_from_disk() {
        let mock = MockTransport::new();
        mock.respond_json(
            "uploadStickerFile",
            200,
            json!({"ok": true, "result": {"file_id": "CAACAgI", "file_unique_id": "AgADx", "file_size": 15}}),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"\x89PNG\r\n").unwrap();

        let file = bot(&mock).upload_sticker(&1001i64, File::from_disk(&path)).await.unwrap();
        assert_eq!(file.file_id, "CAACAgI");
        assert_eq!(file.file_size, Some(15));

        let call = &mock.get_calls()[0];
        assert!(call.streamed);
        let body = String::from_utf8_lossy(&call.body);
        assert!(body.contains("name=\"png_sticker\"; filename=\"cat.png\""));
        assert!(body.contains("name=\"user_id\"\r\n\r\n1001"));
    }

    #[tokio::test]
    async fn test_create_sticker_set_params() {
        let mock = MockTransport::new();
        mock.respond_json("createNewStickerSet", 200, json!({"ok": true, "result": true}));

        let set = NewSticker {
            name: "cats_by_bot".to_string(),
            title: "Cats".to_string(),
            emojis: "🐱".to_string(),
            png: Some(File::from_id("CAACAgI")),
            contains_masks: true,
            mask_position: Some(MaskPosition {
                feature: MaskFeature::Eyes,
                x_shift: 0.0,
                y_shift: 0.5,
                scale: 1.0,
            }),
            ..Default::default()
        };

        bot(&mock).create_sticker_set(&1001i64, set).await.unwrap();

        let call = &mock.get_calls()[0];
        assert_eq!(call.content_type, "application/json");
        let body = call.json();
        assert_eq!(body["png_sticker"], "CAACAgI");
        assert_eq!(body["contains_masks"], "true");
        assert_eq!(body["title"], "Cats");
        let mask: serde_json::Value = serde_json::from_str(body["mask_position"].as_str().unwrap()).unwrap();
        assert_eq!(mask["point"], "eyes");
        assert_eq!(mask["y_shift"], 0.5);
    }

    #[tokio::test]
    async fn test_add_sticker_prefers_png() {
        let mock = MockTransport::new();
        mock.respond_json("addStickerToSet", 200, json!({"ok": true, "result": true}));

        let sticker = NewSticker {
            name: "cats_by_bot".to_string(),
            emojis: "😺".to_string(),
            png: Some(File::from_id("png-id")),
            tgs: Some(File::from_id("tgs-id")),
            ..Default::default()
        };
        bot(&mock).add_sticker(&1001i64, sticker).await.unwrap();

        let body = mock.get_calls()[0].json();
        assert_eq!(body["png_sticker"], "png-id");
        assert!(body.get("tgs_sticker").is_none());
        assert!(body.get("title").is_none());
    }

    #[tokio::test]
    async fn test_sticker_set_not_found() {
        let mock = MockTransport::new();
        mock.respond_json(
            "getStickerSet",
            400,
            json!({"ok": false, "error_code": 400, "description": "Bad Request: STICKERSET_INVALID"}),
        );

        let err = bot(&mock).sticker_set("nope").await.unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::StickerSetInvalid));
    }

    #[tokio::test]
    async fn test_position_and_delete() {
        let mock = MockTransport::new();
        mock.respond_json("setStickerPositionInSet", 200, json!({"ok": true, "result": true}));
        mock.respond_json("deleteStickerFromSet", 200, json!({"ok": true, "result": true}));

        let bot = bot(&mock);
        bot.set_sticker_position("CAAC", 3).await.unwrap();
        bot.delete_sticker("CAAC").await.unwrap();

        let calls = mock.get_calls();
        assert_eq!(calls[0].json(), json!({"sticker": "CAAC", "position": "3"}));
        assert_eq!(calls[1].json(), json!({"sticker": "CAAC"}));
    }

    #[tokio::test]
    async fn test_set_thumb_without_file_fails_before_sending() {
        let mock = MockTransport::new();

        let err = bot(&mock).set_sticker_set_thumb(&1i64, "cats_by_bot", File::default()).await.unwrap_err();
        assert!(matches!(err, Error::MissingFile { ref field } if field == "thumb"));
        assert_eq!(mock.call_count(), 0);
    }
}
