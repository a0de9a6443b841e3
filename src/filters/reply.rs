//! How a matched filter is delivered, and how delivery failures degrade.

use teloxide::RequestError;

use crate::database::{ContentKind, FilterButton, FilterRecord};

/// Sent instead of a filter whose buttons use a scheme Telegram rejects.
pub const UNSUPPORTED_PROTOCOL_NOTICE: &str = "You seem to be trying to use an unsupported url protocol. \
     Telegram doesn't support buttons for some protocols, such as tg://. Please try again.";

/// Sent instead of a filter Telegram refused for any other formatting reason.
pub const MALFORMED_FILTER_NOTICE: &str =
    "This filter could not be sent, as it is incorrectly formatted.";

/// Domains whose link previews are worth keeping.
const PREVIEW_DOMAINS: [&str; 2] = ["telegra.ph", "youtu.be"];

/// Recoverable reasons a formatted reply was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// A button target uses a scheme Telegram does not allow.
    UnsupportedUrlProtocol,
    /// The message being replied to was deleted meanwhile.
    ReplyTargetMissing,
    /// Any other API rejection.
    Other,
}

impl DeliveryFailure {
    /// Classify a request error. Network and transport errors are not
    /// delivery failures and yield `None`.
    pub fn classify(err: &RequestError) -> Option<Self> {
        match err {
            RequestError::Api(api) => Some(Self::from_api_message(&api.to_string())),
            _ => None,
        }
    }

    /// Classify from the description Telegram returned.
    pub fn from_api_message(description: &str) -> Self {
        let description = description.to_lowercase();

        if description.contains("unsupported url protocol")
            || description.contains("button_url_invalid")
        {
            Self::UnsupportedUrlProtocol
        } else if description.contains("reply message not found")
            || description.contains("message to be replied not found")
            || description.contains("replied message not found")
        {
            Self::ReplyTargetMissing
        } else {
            Self::Other
        }
    }
}

/// What to send after a formatted reply was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Reply to the trigger with a fixed explanation instead.
    Notice(&'static str),
    /// Send the same body again, not as a reply and without a preview.
    ResendWithoutReply,
    /// Log the rejection and reply with the malformed-filter notice.
    MalformedNotice,
}

impl DeliveryFailure {
    pub fn fallback(self) -> Fallback {
        match self {
            Self::UnsupportedUrlProtocol => Fallback::Notice(UNSUPPORTED_PROTOCOL_NOTICE),
            Self::ReplyTargetMissing => Fallback::ResendWithoutReply,
            Self::Other => Fallback::MalformedNotice,
        }
    }
}

/// Whether a text reply should go out without a link preview.
pub fn disable_preview(body: &str) -> bool {
    !PREVIEW_DOMAINS.iter().any(|domain| body.contains(domain))
}

/// The single outbound message a matched filter produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPlan<'a> {
    Sticker(&'a str),
    Document(&'a str),
    Image {
        file_id: &'a str,
        buttons: &'a [FilterButton],
    },
    Audio(&'a str),
    Voice(&'a str),
    Video(&'a str),
    /// HTML body with an optional keyboard.
    Text {
        body: &'a str,
        disable_preview: bool,
        buttons: &'a [FilterButton],
    },
    /// Pre-formatting records, sent verbatim.
    Legacy(&'a str),
}

impl<'a> ReplyPlan<'a> {
    pub fn for_record(record: &'a FilterRecord) -> Self {
        let reply = record.reply.as_str();
        match record.kind {
            ContentKind::Sticker => Self::Sticker(reply),
            ContentKind::Document => Self::Document(reply),
            ContentKind::Image => Self::Image {
                file_id: reply,
                buttons: &record.buttons,
            },
            ContentKind::Audio => Self::Audio(reply),
            ContentKind::Voice => Self::Voice(reply),
            ContentKind::Video => Self::Video(reply),
            ContentKind::Text => Self::Text {
                body: reply,
                disable_preview: disable_preview(reply),
                buttons: &record.buttons,
            },
            ContentKind::LegacyText => Self::Legacy(reply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            DeliveryFailure::from_api_message("Bad Request: unsupported URL protocol"),
            DeliveryFailure::UnsupportedUrlProtocol
        );
        assert_eq!(
            DeliveryFailure::from_api_message("Bad Request: BUTTON_URL_INVALID"),
            DeliveryFailure::UnsupportedUrlProtocol
        );
        assert_eq!(
            DeliveryFailure::from_api_message("Bad Request: reply message not found"),
            DeliveryFailure::ReplyTargetMissing
        );
        assert_eq!(
            DeliveryFailure::from_api_message("Bad Request: can't parse entities"),
            DeliveryFailure::Other
        );
    }

    #[test]
    fn test_fallback_per_failure() {
        let protocol = DeliveryFailure::from_api_message("Bad Request: unsupported URL protocol");
        assert_eq!(protocol.fallback(), Fallback::Notice(UNSUPPORTED_PROTOCOL_NOTICE));

        let gone = DeliveryFailure::from_api_message("Bad Request: message to be replied not found");
        assert_eq!(gone.fallback(), Fallback::ResendWithoutReply);

        let other = DeliveryFailure::from_api_message("Bad Request: message text is empty");
        assert_eq!(other.fallback(), Fallback::MalformedNotice);
    }

    #[test]
    fn test_non_api_errors_are_not_delivery_failures() {
        let err = RequestError::MigrateToChatId(teloxide::types::ChatId(-100123));
        assert_eq!(DeliveryFailure::classify(&err), None);
    }

    #[test]
    fn test_preview_policy() {
        assert!(disable_preview("see https://example.com"));
        assert!(!disable_preview("read https://telegra.ph/post"));
        assert!(!disable_preview("watch https://youtu.be/abc"));
    }

    #[test]
    fn test_plan_for_text_and_media() {
        let text = FilterRecord::new(
            1,
            "hi",
            "<b>Hello</b> https://example.com",
            ContentKind::Text,
            vec![FilterButton::new("Go", "https://example.com", false)],
        );
        match ReplyPlan::for_record(&text) {
            ReplyPlan::Text {
                body,
                disable_preview,
                buttons,
            } => {
                assert_eq!(body, "<b>Hello</b> https://example.com");
                assert!(disable_preview);
                assert_eq!(buttons.len(), 1);
            }
            other => panic!("unexpected plan {other:?}"),
        }

        let sticker = FilterRecord::new(1, "s", "file", ContentKind::Sticker, vec![]);
        assert_eq!(ReplyPlan::for_record(&sticker), ReplyPlan::Sticker("file"));

        let legacy = FilterRecord::new(1, "l", "*raw*", ContentKind::LegacyText, vec![]);
        assert_eq!(ReplyPlan::for_record(&legacy), ReplyPlan::Legacy("*raw*"));
    }
}
