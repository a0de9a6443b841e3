//! Custom filters core.
//!
//! Pure logic behind the filter commands and the per-message scan:
//!
//! - `classifier` - turn a `/filter` invocation into a record draft
//! - `matcher` - find the first registered keyword in a message
//! - `reply` - decide how a matched filter is sent, and how failures degrade
//! - `paginator` - pages and navigation tokens for `/filters`
//!
//! Telegram I/O lives in `plugins::filters` and `events::filters`.

pub mod classifier;
pub mod error;
pub mod matcher;
pub mod paginator;
pub mod reply;

pub use classifier::{classify, ReplySource};
pub use error::FilterError;
pub use matcher::KeywordMatcher;
pub use paginator::{paginate, parse_page_arg, CallbackToken, CALLBACK_PREFIX};
pub use reply::{DeliveryFailure, Fallback, ReplyPlan, MALFORMED_FILTER_NOTICE};

/// Summary line for the bot-wide statistics report.
pub fn stats_summary(filters: u64, chats: u64) -> String {
    format!("{} filters, across {} chats.", filters, chats)
}

/// Summary line for a chat's settings overview.
pub fn settings_summary(count: usize) -> String {
    format!("There are <code>{}</code> custom filters here.", count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summaries() {
        assert_eq!(stats_summary(12, 3), "12 filters, across 3 chats.");
        assert_eq!(settings_summary(0), "There are <code>0</code> custom filters here.");
    }
}
