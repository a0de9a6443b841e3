//! Chat migration hook.
//!
//! When a group is upgraded to a supergroup Telegram sends a service
//! message carrying the new chat id; every filter follows the chat.

use teloxide::prelude::*;
use tracing::info;

use crate::bot::AppState;

/// Remap all state keyed by the old chat id.
pub async fn migrate_chat(
    state: &AppState,
    old_chat_id: ChatId,
    new_chat_id: ChatId,
) -> anyhow::Result<()> {
    let moved = state.filters.migrate_chat(old_chat_id.0, new_chat_id.0).await?;

    state.connections.migrate(old_chat_id, new_chat_id);
    state.permissions.invalidate_chat(old_chat_id);
    state.chat_titles.invalidate(&old_chat_id.0);

    info!(
        "Chat {} migrated to {}: {} filters moved",
        old_chat_id, new_chat_id, moved
    );
    Ok(())
}

/// Handle a `migrate_to_chat_id` service message.
pub async fn migration_handler(msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(new_chat_id) = msg.migrate_to_chat_id().map(|id| ChatId(id.0)) else {
        return Ok(());
    };
    migrate_chat(&state, msg.chat.id, new_chat_id).await
}
