//! Event handler system.
//!
//! - `filters` - per-message keyword scan (new and edited messages)
//! - `migrate` - group to supergroup migration

pub mod filters;
pub mod migrate;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::error;

use crate::bot::{AppState, ThrottledBot};

/// Build the message event handler.
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            dptree::filter(|msg: Message| msg.migrate_to_chat_id().is_some())
                .endpoint(migrate::migration_handler),
        )
        .branch(dptree::endpoint(scan_message))
}

/// Build the edited message handler.
pub fn edited_message_handler() -> UpdateHandler<anyhow::Error> {
    dptree::endpoint(scan_message)
}

async fn scan_message(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    // A failed filter must not fail the update
    if let Err(e) = filters::check_filters(&bot, &msg, &state).await {
        error!("Filters error in chat {}: {}", msg.chat.id, e);
    }
    Ok(())
}
