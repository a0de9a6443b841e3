//! Render Telegram message entities back into HTML.
//!
//! Telegram strips formatting from command text and reports it as entities
//! with UTF-16 offsets into the whole message. Filter bodies are a substring
//! of that message, so entities are clipped and shifted before rendering.

use teloxide::types::{MessageEntity, MessageEntityKind};

use crate::utils::html_escape;

/// Render `text` as Telegram HTML.
///
/// `offset` is the UTF-16 position of `text` inside the message the
/// entities belong to.
pub fn render_html(text: &str, entities: &[MessageEntity], offset: usize) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let mut spans: Vec<(usize, usize, String, &'static str)> = entities
        .iter()
        .filter_map(|e| {
            let (open, close) = tags(&e.kind)?;
            let start = e.offset.saturating_sub(offset).min(len);
            let end = (e.offset + e.length).saturating_sub(offset).min(len);
            (start < end).then_some((start, end, open, close))
        })
        .collect();
    // Outer entities first when two start together
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut out = String::with_capacity(text.len() + spans.len() * 8);
    let mut cursor = 0;
    let mut open: Vec<(usize, &'static str)> = vec![];

    for (start, end, open_tag, close_tag) in spans {
        close_until(&units, &mut out, &mut cursor, &mut open, start);

        push_text(&units, &mut out, cursor, start);
        cursor = start;

        // Never let a child outlive its parent
        let end = open.last().map_or(end, |(parent_end, _)| end.min(*parent_end));
        out.push_str(&open_tag);
        open.push((end, close_tag));
    }

    close_until(&units, &mut out, &mut cursor, &mut open, usize::MAX);
    push_text(&units, &mut out, cursor, len);
    out
}

/// Close every open tag whose span ends at or before `limit`.
fn close_until(
    units: &[u16],
    out: &mut String,
    cursor: &mut usize,
    open: &mut Vec<(usize, &'static str)>,
    limit: usize,
) {
    while let Some(&(end, close)) = open.last() {
        if end > limit {
            break;
        }
        push_text(units, out, *cursor, end);
        *cursor = (*cursor).max(end);
        out.push_str(close);
        open.pop();
    }
}

fn push_text(units: &[u16], out: &mut String, from: usize, to: usize) {
    if from < to {
        out.push_str(&html_escape(&String::from_utf16_lossy(&units[from..to])));
    }
}

fn tags(kind: &MessageEntityKind) -> Option<(String, &'static str)> {
    let pair = match kind {
        MessageEntityKind::Bold => ("<b>".to_string(), "</b>"),
        MessageEntityKind::Italic => ("<i>".to_string(), "</i>"),
        MessageEntityKind::Underline => ("<u>".to_string(), "</u>"),
        MessageEntityKind::Strikethrough => ("<s>".to_string(), "</s>"),
        MessageEntityKind::Spoiler => ("<tg-spoiler>".to_string(), "</tg-spoiler>"),
        MessageEntityKind::Code => ("<code>".to_string(), "</code>"),
        MessageEntityKind::Pre { language: Some(lang) } => (
            format!("<pre><code class=\"language-{}\">", html_escape(lang)),
            "</code></pre>",
        ),
        MessageEntityKind::Pre { language: None } => ("<pre>".to_string(), "</pre>"),
        MessageEntityKind::TextLink { url } => (
            format!("<a href=\"{}\">", html_escape(url.as_str()).replace('"', "&quot;")),
            "</a>",
        ),
        MessageEntityKind::TextMention { user } => {
            (format!("<a href=\"tg://user?id={}\">", user.id), "</a>")
        }
        _ => return None,
    };
    Some(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: MessageEntityKind, offset: usize, length: usize) -> MessageEntity {
        MessageEntity { kind, offset, length }
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(render_html("a < b & c", &[], 0), "a &lt; b &amp; c");
    }

    #[test]
    fn test_offset_shifts_entities() {
        // "/filter hi Hello world" with "Hello" bold; body starts at 11
        let entities = vec![entity(MessageEntityKind::Bold, 11, 5)];
        assert_eq!(render_html("Hello world", &entities, 11), "<b>Hello</b> world");
    }

    #[test]
    fn test_entities_before_body_are_dropped() {
        let entities = vec![
            entity(MessageEntityKind::BotCommand, 0, 7),
            entity(MessageEntityKind::Italic, 8, 2),
        ];
        assert_eq!(render_html("body", &entities, 11), "body");
    }

    #[test]
    fn test_nested_entities() {
        let entities = vec![
            entity(MessageEntityKind::Bold, 0, 11),
            entity(MessageEntityKind::Italic, 6, 5),
        ];
        assert_eq!(render_html("Hello world", &entities, 0), "<b>Hello <i>world</i></b>");
    }

    #[test]
    fn test_utf16_offsets() {
        // The emoji takes two UTF-16 units
        let entities = vec![entity(MessageEntityKind::Code, 3, 2)];
        assert_eq!(render_html("\u{1F600} ok", &entities, 0), "\u{1F600} <code>ok</code>");
    }

    #[test]
    fn test_text_link() {
        let url = "https://example.com/?a=1&b=2".parse().unwrap();
        let entities = vec![entity(MessageEntityKind::TextLink { url }, 0, 4)];
        assert_eq!(
            render_html("site", &entities, 0),
            "<a href=\"https://example.com/?a=1&amp;b=2\">site</a>"
        );
    }
}
