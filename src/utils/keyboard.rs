//! Inline keyboard construction for filter replies.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::debug;
use url::Url;

use crate::database::FilterButton;

/// Lay stored buttons out into keyboard rows.
///
/// A `same_row` button joins the previous row; the first button always
/// starts one. Bare hosts (`example.com`) get an https scheme; targets
/// that are not URLs at all are skipped. Anything URL-shaped, whatever
/// its scheme, is left for Telegram to accept or reject.
pub fn build_keyboard(buttons: &[FilterButton]) -> Vec<Vec<InlineKeyboardButton>> {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![];

    for btn in buttons {
        let Ok(url) = Url::parse(&btn.target).or_else(|_| Url::parse(&format!("https://{}", btn.target)))
        else {
            debug!("Skipping button '{}' with invalid target '{}'", btn.label, btn.target);
            continue;
        };
        let button = InlineKeyboardButton::url(btn.label.clone(), url);

        match rows.last_mut() {
            Some(row) if btn.same_row => row.push(button),
            _ => rows.push(vec![button]),
        }
    }

    rows
}

/// Keyboard markup for a reply, `None` when no usable buttons remain.
pub fn reply_markup(buttons: &[FilterButton]) -> Option<InlineKeyboardMarkup> {
    let rows = build_keyboard(buttons);
    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_same_row_flag() {
        let buttons = vec![
            FilterButton::new("A", "https://a.example", true),
            FilterButton::new("B", "https://b.example", true),
            FilterButton::new("C", "https://c.example", false),
        ];
        let rows = build_keyboard(&buttons);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1][0].text, "C");
    }

    #[test]
    fn test_bare_host_gets_scheme() {
        let rows = build_keyboard(&[FilterButton::new("Site", "example.com/docs", false)]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_unparsable_target_skipped() {
        let buttons = vec![
            FilterButton::new("Bad", "not a url", false),
            FilterButton::new("Good", "tg://resolve?domain=example", false),
        ];
        let rows = build_keyboard(&buttons);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].text, "Good");
        assert!(reply_markup(&buttons[..1]).is_none());
    }
}
