//! Filter model for keyword-triggered auto-replies.

use serde::{Deserialize, Serialize};

use crate::database::FilterButton;
use crate::filters::FilterError;

/// What a filter replies with.
///
/// Exactly one kind per record. `LegacyText` only appears on records
/// written before formatted text existed; new filters never get it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Formatted text (Telegram HTML), may carry buttons
    Text,
    Sticker,
    Document,
    /// Photo by file id, may carry buttons
    Image,
    Audio,
    Voice,
    Video,
    /// Unformatted text from old records
    LegacyText,
}

impl ContentKind {
    /// Whether buttons are kept for this kind.
    pub fn supports_buttons(self) -> bool {
        matches!(self, Self::Text | Self::Image)
    }

    /// Collapse the old independent boolean flags into a single kind.
    pub fn from_legacy_flags(flags: &LegacyFlags) -> Result<Self, FilterError> {
        let set: Vec<(&'static str, Self)> = [
            ("is_sticker", flags.is_sticker, Self::Sticker),
            ("is_document", flags.is_document, Self::Document),
            ("is_image", flags.is_image, Self::Image),
            ("is_audio", flags.is_audio, Self::Audio),
            ("is_voice", flags.is_voice, Self::Voice),
            ("is_video", flags.is_video, Self::Video),
        ]
        .into_iter()
        .filter(|(_, on, _)| *on)
        .map(|(name, _, kind)| (name, kind))
        .collect();

        match set.as_slice() {
            [] if flags.has_markdown => Ok(Self::Text),
            [] => Ok(Self::LegacyText),
            [(_, kind)] => Ok(*kind),
            _ => Err(FilterError::ConflictingLegacyFlags(
                set.iter().map(|(name, _)| *name).collect(),
            )),
        }
    }
}

/// Content flags as stored by the old schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyFlags {
    #[serde(default)]
    pub is_sticker: bool,
    #[serde(default)]
    pub is_document: bool,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_audio: bool,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub has_markdown: bool,
}

impl LegacyFlags {
    /// Field names to `$unset` once a record has been converted.
    pub const FIELDS: [&'static str; 7] = [
        "is_sticker",
        "is_document",
        "is_image",
        "is_audio",
        "is_voice",
        "is_video",
        "has_markdown",
    ];
}

/// A single filter (stored in the `filters` collection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterRecord {
    /// Chat ID this filter belongs to
    pub chat_id: i64,

    /// Lowercase trigger, unique per chat
    pub keyword: String,

    /// HTML body for text kinds, file id for media kinds
    pub reply: String,

    pub kind: ContentKind,

    /// Buttons for the reply
    #[serde(default)]
    pub buttons: Vec<FilterButton>,

    /// First registration time (ms); fixes the keyword's position in listings
    #[serde(default)]
    pub created_at: i64,
}

impl FilterRecord {
    /// Create a record, normalising the keyword and dropping buttons
    /// the content kind cannot carry.
    pub fn new(
        chat_id: i64,
        keyword: &str,
        reply: impl Into<String>,
        kind: ContentKind,
        buttons: Vec<FilterButton>,
    ) -> Self {
        let buttons = if kind.supports_buttons() { buttons } else { vec![] };

        Self {
            chat_id,
            keyword: keyword.to_lowercase(),
            reply: reply.into(),
            kind,
            buttons,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_keyword() {
        let record = FilterRecord::new(1, "HeLLo There", "hi", ContentKind::Text, vec![]);
        assert_eq!(record.keyword, "hello there");
    }

    #[test]
    fn test_buttons_dropped_for_media() {
        let button = FilterButton::new("Site", "https://example.com", false);

        let sticker = FilterRecord::new(1, "s", "file", ContentKind::Sticker, vec![button.clone()]);
        let image = FilterRecord::new(1, "i", "file", ContentKind::Image, vec![button]);

        assert!(sticker.buttons.is_empty());
        assert_eq!(image.buttons.len(), 1);
    }

    #[test]
    fn test_legacy_flags_single_kind() {
        let flags = LegacyFlags { is_voice: true, ..Default::default() };
        assert_eq!(ContentKind::from_legacy_flags(&flags), Ok(ContentKind::Voice));
    }

    #[test]
    fn test_legacy_flags_text_variants() {
        let markdown = LegacyFlags { has_markdown: true, ..Default::default() };
        assert_eq!(ContentKind::from_legacy_flags(&markdown), Ok(ContentKind::Text));
        assert_eq!(
            ContentKind::from_legacy_flags(&LegacyFlags::default()),
            Ok(ContentKind::LegacyText)
        );
    }

    #[test]
    fn test_legacy_flags_conflict_rejected() {
        let flags = LegacyFlags {
            is_sticker: true,
            is_image: true,
            has_markdown: true,
            ..Default::default()
        };
        assert_eq!(
            ContentKind::from_legacy_flags(&flags),
            Err(FilterError::ConflictingLegacyFlags(vec!["is_sticker", "is_image"]))
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ContentKind::LegacyText).unwrap();
        assert_eq!(json, "\"legacy_text\"");
    }
}
