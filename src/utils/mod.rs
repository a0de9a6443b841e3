//! Utility functions.
//!
//! Collection of helper functions used across the bot.

pub mod entities;
pub mod keyboard;
pub mod parser;

pub use entities::render_html;
pub use keyboard::reply_markup;
pub use parser::{parse_buttons, split_quotes};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reverse `html_escape`.
pub fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Text a reader would see once the HTML tags are removed.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    html_unescape(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip_on_ampersand_entities() {
        let raw = "a &lt; b & <c>";
        assert_eq!(html_escape(raw), "a &amp;lt; b &amp; &lt;c&gt;");
        assert_eq!(html_unescape(&html_escape(raw)), raw);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b></b>"), "");
        assert_eq!(strip_tags("<b>Hi</b> <a href=\"x\">there</a>"), "Hi there");
        assert_eq!(strip_tags("a &lt; b"), "a < b");
    }
}
