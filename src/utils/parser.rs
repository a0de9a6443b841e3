//! Command argument and button parsing.
//!
//! - Keywords: first token, or a quoted phrase (`"hey there"`)
//! - Buttons: `[Text](buttonurl://url)`, `[Text](buttonurl://url:same)`

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::FilterButton;
use crate::utils::html_unescape;

/// Opening quotes accepted around a keyword, with their closing partner.
const QUOTES: [(char, char); 3] = [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')];

static BUTTON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\[\]]+?)\]\(buttonurl:(?:/{0,2})(.+?)(:same)?\)")
        .expect("button pattern is a valid literal")
});

/// Result of splitting command arguments into a key and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitArgs<'a> {
    /// The keyword, quotes and escapes removed.
    pub key: String,
    /// Everything after the keyword, trimmed.
    pub rest: &'a str,
    /// Byte offset of `rest` within the input.
    pub rest_offset: usize,
}

/// Split `text` into a keyword and the remainder.
///
/// A keyword starting with a quote runs to the matching closing quote and
/// may contain spaces; `\` escapes the next character. Without a closing
/// quote the text is split on whitespace like any other.
pub fn split_quotes(text: &str) -> Option<SplitArgs<'_>> {
    let lead = text.len() - text.trim_start().len();
    let text_trimmed = &text[lead..];
    let first = text_trimmed.chars().next()?;

    if let Some(&(open, close)) = QUOTES.iter().find(|(open, _)| *open == first) {
        let mut chars = text_trimmed.char_indices().skip(1);
        while let Some((idx, c)) = chars.next() {
            if c == '\\' {
                chars.next();
                continue;
            }
            if c == close {
                let inner = &text_trimmed[open.len_utf8()..idx];
                let mut key = remove_escapes(inner.trim());
                if key.is_empty() {
                    key = format!("{open}{open}");
                }
                let after = idx + c.len_utf8();
                return Some(rest_from(text, lead + after, key));
            }
        }
    }

    let end = text_trimmed
        .find(char::is_whitespace)
        .unwrap_or(text_trimmed.len());
    Some(rest_from(text, lead + end, text_trimmed[..end].to_string()))
}

fn rest_from(text: &str, from: usize, key: String) -> SplitArgs<'_> {
    let tail = &text[from..];
    let skipped = tail.len() - tail.trim_start().len();
    SplitArgs {
        key,
        rest: tail.trim(),
        rest_offset: from + skipped,
    }
}

fn remove_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Extract buttons from rendered HTML text.
///
/// Returns (text without buttons, buttons in order). Labels and targets
/// are unescaped since they leave the HTML body.
pub fn parse_buttons(input: &str) -> (String, Vec<FilterButton>) {
    let mut buttons = vec![];
    let mut text = String::with_capacity(input.len());
    let mut last = 0;

    for caps in BUTTON_RE.captures_iter(input) {
        let (Some(whole), Some(label), Some(target)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        text.push_str(&input[last..whole.start()]);
        last = whole.end();

        buttons.push(FilterButton::new(
            html_unescape(label.as_str().trim()),
            html_unescape(target.as_str().trim()),
            caps.get(3).is_some(),
        ));
    }
    text.push_str(&input[last..]);

    (text, buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        let split = split_quotes("hello   there friend").unwrap();
        assert_eq!(split.key, "hello");
        assert_eq!(split.rest, "there friend");
        assert_eq!(split.rest_offset, 8);
    }

    #[test]
    fn test_split_quoted_keyword() {
        let input = "\"hey there\" How you doin?";
        let split = split_quotes(input).unwrap();
        assert_eq!(split.key, "hey there");
        assert_eq!(split.rest, "How you doin?");
        assert_eq!(&input[split.rest_offset..], "How you doin?");
    }

    #[test]
    fn test_split_smart_quotes_and_escapes() {
        let split = split_quotes("\u{201c}say \\\u{201d}hi\u{201d} reply").unwrap();
        assert_eq!(split.key, "say \u{201d}hi");
        assert_eq!(split.rest, "reply");
    }

    #[test]
    fn test_split_unclosed_quote_falls_back() {
        let split = split_quotes("\"oops reply").unwrap();
        assert_eq!(split.key, "\"oops");
        assert_eq!(split.rest, "reply");
    }

    #[test]
    fn test_split_keyword_only() {
        let split = split_quotes("  word  ").unwrap();
        assert_eq!(split.key, "word");
        assert_eq!(split.rest, "");
        assert!(split_quotes("   ").is_none());
    }

    #[test]
    fn test_parse_buttons_rows() {
        let input = "Hi [Site](buttonurl://example.com) [Docs](buttonurl:docs.rs:same)";
        let (text, buttons) = parse_buttons(input);

        assert_eq!(text.trim(), "Hi");
        assert_eq!(
            buttons,
            vec![
                FilterButton::new("Site", "example.com", false),
                FilterButton::new("Docs", "docs.rs", true),
            ]
        );
    }

    #[test]
    fn test_parse_buttons_unescapes_target() {
        let (_, buttons) = parse_buttons("[Go](buttonurl://x.com/?a=1&amp;b=2)");
        assert_eq!(buttons[0].target, "x.com/?a=1&b=2");
    }

    #[test]
    fn test_parse_buttons_none() {
        let (text, buttons) = parse_buttons("[not a button](https://example.com)");
        assert_eq!(text, "[not a button](https://example.com)");
        assert!(buttons.is_empty());
    }
}
