//! Content classification for `/filter`.
//!
//! Decides what a new filter replies with, in this order:
//! 1. text after the keyword (formatted, with buttons)
//! 2. the replied-to sticker, document, photo, audio, voice or video
//! 3. otherwise nothing, which is an error

use teloxide::types::{Message, MessageEntity};

use crate::database::{ContentKind, FilterButton, FilterRecord};
use crate::filters::FilterError;
use crate::utils::{parse_buttons, render_html, split_quotes, strip_tags};

/// Media a `/filter` command may be replying to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplySource {
    /// Not a reply, or a reply to something that cannot be a filter.
    None,
    Sticker(String),
    Document(String),
    Photo {
        file_id: String,
        caption: Option<String>,
        caption_entities: Vec<MessageEntity>,
    },
    Audio(String),
    Voice(String),
    Video(String),
}

impl ReplySource {
    /// Extract the usable content of a replied-to message.
    pub fn from_message(msg: &Message) -> Self {
        if let Some(sticker) = msg.sticker() {
            Self::Sticker(sticker.file.id.to_string())
        } else if let Some(document) = msg.document() {
            Self::Document(document.file.id.to_string())
        } else if let Some(photo) = msg.photo() {
            match photo.iter().max_by_key(|p| p.width * p.height) {
                Some(largest) => Self::Photo {
                    file_id: largest.file.id.to_string(),
                    caption: msg.caption().map(String::from),
                    caption_entities: msg.caption_entities().map(<[_]>::to_vec).unwrap_or_default(),
                },
                None => Self::None,
            }
        } else if let Some(audio) = msg.audio() {
            Self::Audio(audio.file.id.to_string())
        } else if let Some(voice) = msg.voice() {
            Self::Voice(voice.file.id.to_string())
        } else if let Some(video) = msg.video() {
            Self::Video(video.file.id.to_string())
        } else {
            Self::None
        }
    }
}

/// A classified filter, not yet bound to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDraft {
    pub keyword: String,
    pub reply: String,
    pub kind: ContentKind,
    pub buttons: Vec<FilterButton>,
}

impl FilterDraft {
    pub fn into_record(self, chat_id: i64) -> FilterRecord {
        FilterRecord::new(chat_id, &self.keyword, self.reply, self.kind, self.buttons)
    }
}

/// Classify a `/filter` command.
///
/// `text` is the whole command message and `entities` its entities, with
/// offsets relative to `text`.
pub fn classify(
    text: &str,
    entities: &[MessageEntity],
    source: &ReplySource,
) -> Result<FilterDraft, FilterError> {
    let args_start = text.find(char::is_whitespace).ok_or(FilterError::MissingKeyword)?;
    let split = split_quotes(&text[args_start..]).ok_or(FilterError::MissingKeyword)?;

    let keyword = split.key.to_lowercase();
    if keyword.is_empty() {
        return Err(FilterError::MissingKeyword);
    }

    let draft = |reply: String, kind: ContentKind, buttons: Vec<FilterButton>| FilterDraft {
        keyword: keyword.clone(),
        reply,
        kind,
        buttons,
    };

    if !split.rest.is_empty() {
        let body_start = args_start + split.rest_offset;
        let offset = text[..body_start].encode_utf16().count();
        let html = render_html(split.rest, entities, offset);

        let (body, buttons) = parse_buttons(&html);
        let body = body.trim();
        // Formatting around the buttons leaves empty tags behind
        if strip_tags(body).trim().is_empty() {
            return Err(FilterError::ButtonsWithoutText);
        }
        return Ok(draft(body.to_string(), ContentKind::Text, buttons));
    }

    match source {
        ReplySource::Sticker(id) => Ok(draft(id.clone(), ContentKind::Sticker, vec![])),
        ReplySource::Document(id) => Ok(draft(id.clone(), ContentKind::Document, vec![])),
        ReplySource::Photo {
            file_id,
            caption,
            caption_entities,
        } => {
            // Only the caption's buttons are kept; the reply is the photo itself
            let buttons = caption
                .as_deref()
                .map(|c| parse_buttons(&render_html(c, caption_entities, 0)).1)
                .unwrap_or_default();
            Ok(draft(file_id.clone(), ContentKind::Image, buttons))
        }
        ReplySource::Audio(id) => Ok(draft(id.clone(), ContentKind::Audio, vec![])),
        ReplySource::Voice(id) => Ok(draft(id.clone(), ContentKind::Voice, vec![])),
        ReplySource::Video(id) => Ok(draft(id.clone(), ContentKind::Video, vec![])),
        ReplySource::None => Err(FilterError::MissingContent),
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::MessageEntityKind;

    use super::*;

    fn bold(offset: usize, length: usize) -> MessageEntity {
        MessageEntity {
            kind: MessageEntityKind::Bold,
            offset,
            length,
        }
    }

    #[test]
    fn test_text_filter() {
        let draft = classify("/filter Hello Hi there!", &[], &ReplySource::None).unwrap();

        assert_eq!(draft.keyword, "hello");
        assert_eq!(draft.reply, "Hi there!");
        assert_eq!(draft.kind, ContentKind::Text);
        assert!(draft.buttons.is_empty());
    }

    #[test]
    fn test_quoted_keyword_with_formatting() {
        let text = "/filter \"Hey There\" How you doin?";
        // "How" is bold: starts after the closing quote and a space
        let entities = vec![bold(20, 3)];
        let draft = classify(text, &entities, &ReplySource::None).unwrap();

        assert_eq!(draft.keyword, "hey there");
        assert_eq!(draft.reply, "<b>How</b> you doin?");
    }

    #[test]
    fn test_text_wins_over_reply_media() {
        let source = ReplySource::Sticker("sticker-id".into());
        let draft = classify("/filter hi hello", &[], &source).unwrap();
        assert_eq!(draft.kind, ContentKind::Text);
    }

    #[test]
    fn test_buttons_extracted() {
        let draft = classify(
            "/filter rules Read them [Rules](buttonurl://example.com/rules)",
            &[],
            &ReplySource::None,
        )
        .unwrap();

        assert_eq!(draft.reply, "Read them");
        assert_eq!(draft.buttons, vec![FilterButton::new("Rules", "example.com/rules", false)]);
    }

    #[test]
    fn test_buttons_only_rejected() {
        let err = classify(
            "/filter rules [Rules](buttonurl://example.com)",
            &[],
            &ReplySource::None,
        )
        .unwrap_err();
        assert_eq!(err, FilterError::ButtonsWithoutText);
    }

    #[test]
    fn test_formatted_buttons_only_rejected() {
        let text = "/filter rules [Rules](buttonurl://example.com)";
        // Bold covers the whole button markup
        let entities = vec![bold(14, 32)];
        let err = classify(text, &entities, &ReplySource::None).unwrap_err();
        assert_eq!(err, FilterError::ButtonsWithoutText);
    }

    #[test]
    fn test_reply_media_kinds() {
        let cases = [
            (ReplySource::Sticker("s".into()), ContentKind::Sticker),
            (ReplySource::Document("d".into()), ContentKind::Document),
            (ReplySource::Audio("a".into()), ContentKind::Audio),
            (ReplySource::Voice("v".into()), ContentKind::Voice),
            (ReplySource::Video("m".into()), ContentKind::Video),
        ];

        for (source, kind) in cases {
            let draft = classify("/filter KEY", &[], &source).unwrap();
            assert_eq!(draft.kind, kind);
            assert_eq!(draft.keyword, "key");
            assert!(draft.buttons.is_empty());
        }
    }

    #[test]
    fn test_photo_keeps_caption_buttons() {
        let source = ReplySource::Photo {
            file_id: "photo-id".into(),
            caption: Some("Look [Shop](buttonurl://shop.example)".into()),
            caption_entities: vec![],
        };
        let draft = classify("/filter cat", &[], &source).unwrap();

        assert_eq!(draft.kind, ContentKind::Image);
        assert_eq!(draft.reply, "photo-id");
        assert_eq!(draft.buttons.len(), 1);
    }

    #[test]
    fn test_missing_keyword_and_content() {
        assert_eq!(
            classify("/filter", &[], &ReplySource::None).unwrap_err(),
            FilterError::MissingKeyword
        );
        assert_eq!(
            classify("/filter   ", &[], &ReplySource::None).unwrap_err(),
            FilterError::MissingKeyword
        );
        assert_eq!(
            classify("/filter lonely", &[], &ReplySource::None).unwrap_err(),
            FilterError::MissingContent
        );
    }
}
