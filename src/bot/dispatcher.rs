//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::config::ReplyAnchor;
use crate::connections::Connections;
use crate::database::FilterStore;
use crate::events;
use crate::filters::KeywordMatcher;
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Keyword store (MongoDB or in-memory).
    pub filters: Arc<dyn FilterStore>,

    /// Cache registry for creating/accessing caches.
    pub cache: Arc<CacheRegistry>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,

    /// Private-chat connections to groups.
    pub connections: Connections,

    /// Keyword matcher with compiled pattern cache.
    pub matcher: KeywordMatcher,

    /// ChatID -> title
    pub chat_titles: TypedCache<i64, String>,

    /// Owner user IDs (bypass all restrictions).
    pub owner_ids: Vec<u64>,

    /// Which message a filter reply is attached to.
    pub reply_anchor: ReplyAnchor,
}

impl AppState {
    pub fn new(
        bot: &ThrottledBot,
        filters: Arc<dyn FilterStore>,
        cache: Arc<CacheRegistry>,
        owner_ids: Vec<u64>,
        reply_anchor: ReplyAnchor,
    ) -> Self {
        // Permissions needs the inner Bot for API calls
        let permissions =
            Permissions::with_owners(bot.inner().clone(), cache.clone(), owner_ids.clone());
        let matcher = KeywordMatcher::new(&cache);
        let chat_titles = cache.get_or_create("chat_titles", CacheConfig::cold_data());

        Self {
            filters,
            cache,
            permissions,
            connections: Connections::new(),
            matcher,
            chat_titles,
            owner_ids,
            reply_anchor,
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }

    /// Display name of a chat, for listings and confirmations.
    ///
    /// Private chats without a connection hold "local" filters.
    pub async fn chat_name(&self, bot: &ThrottledBot, chat_id: ChatId) -> String {
        if chat_id.is_user() {
            return "local filters".to_string();
        }

        if let Some(title) = self.chat_titles.get(&chat_id.0) {
            return title;
        }

        match bot.get_chat(chat_id).await {
            Ok(chat) => {
                let title = chat.title().unwrap_or("this chat").to_string();
                self.chat_titles.insert(chat_id.0, title.clone());
                title
            }
            Err(e) => {
                debug!("Cannot fetch title of chat {}: {}", chat_id, e);
                "this chat".to_string()
            }
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, then the per-message scan and service events
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    // Edited messages may trigger filters too
    let edited_handler = Update::filter_edited_message().branch(events::edited_message_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(edited_handler)
        .branch(plugins::callback_handler())
}
