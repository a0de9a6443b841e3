//! Connection commands.
//!
//! Let a user manage a group's filters from their private chat.

use teloxide::prelude::*;
use tracing::{info, warn};

use super::reply_html;
use crate::bot::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle /connect <chat_id>.
pub async fn connect_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if !msg.chat.is_private() {
        reply_html(&bot, &msg, "Use /connect in a private chat with me.").await?;
        return Ok(());
    }

    let Ok(chat_id) = args.trim().parse::<i64>().map(ChatId) else {
        reply_html(&bot, &msg, "Usage: /connect &lt;chat id&gt;").await?;
        return Ok(());
    };

    let is_member = match state.permissions.is_member(chat_id, user.id).await {
        Ok(is_member) => is_member,
        Err(e) => {
            warn!("Cannot check membership of {} in {}: {}", user.id, chat_id, e);
            false
        }
    };
    if !is_member {
        reply_html(&bot, &msg, "You can only connect to chats you are a member of.").await?;
        return Ok(());
    }

    state.connections.connect(user.id, chat_id);
    info!("User {} connected to chat {}", user.id, chat_id);

    let chat_name = state.chat_name(&bot, chat_id).await;
    reply_html(
        &bot,
        &msg,
        &format!("Connected to <b>{}</b>!", html_escape(&chat_name)),
    )
    .await
}

/// Handle /disconnect.
pub async fn disconnect_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match state.connections.disconnect(user.id) {
        Some(chat_id) => {
            let chat_name = state.chat_name(&bot, chat_id).await;
            reply_html(
                &bot,
                &msg,
                &format!("Disconnected from <b>{}</b>.", html_escape(&chat_name)),
            )
            .await
        }
        None => reply_html(&bot, &msg, "You aren't connected to any chat.").await,
    }
}

/// Handle /connection - show the current connection.
pub async fn connection_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match state.connections.connected_chat(user.id) {
        Some(chat_id) => {
            let chat_name = state.chat_name(&bot, chat_id).await;
            reply_html(
                &bot,
                &msg,
                &format!(
                    "You are connected to <b>{}</b> (<code>{}</code>).",
                    html_escape(&chat_name),
                    chat_id
                ),
            )
            .await
        }
        None => reply_html(&bot, &msg, "You aren't connected to any chat.").await,
    }
}
