//! Filter command handlers.
//!
//! Commands for managing keyword auto-replies, usable in a group or from
//! a private chat connected to one.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info};

use super::reply_html;
use crate::bot::{AppState, ThrottledBot};
use crate::connections::Resolved;
use crate::filters::{
    classify, paginate, parse_page_arg, settings_summary, stats_summary, CallbackToken,
    ReplySource,
};
use crate::utils::html_escape;

/// Resolve the chat a management command acts on.
///
/// Follows a private-chat connection when there is one, then checks admin
/// standing if `need_admin`. Replies with the reason and returns `None`
/// when the command may not proceed.
async fn managed_chat(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    need_admin: bool,
) -> anyhow::Result<Option<ChatId>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };

    let resolved = state
        .connections
        .resolve(msg.chat.id, user.id, &state.permissions, need_admin)
        .await?;

    match resolved {
        Resolved::Connected(chat_id) => Ok(Some(chat_id)),
        Resolved::NotAdmin(_) => {
            reply_html(bot, msg, "You need to be an admin in the connected chat to do this.").await?;
            Ok(None)
        }
        Resolved::Current => {
            if need_admin && !state.permissions.is_admin(msg.chat.id, user.id).await? {
                reply_html(bot, msg, "You need to be an admin to do this.").await?;
                return Ok(None);
            }
            Ok(Some(msg.chat.id))
        }
    }
}

/// Handle /filter command - add or replace a filter.
///
/// Usage:
/// - /filter <keyword> <reply>
/// - /filter "multi word keyword" <reply>
/// - reply to a sticker/document/photo/audio/voice/video with /filter <keyword>
pub async fn filter_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(chat_id) = managed_chat(&bot, &msg, &state, true).await? else {
        return Ok(());
    };

    let text = msg.text().unwrap_or("");
    let entities = msg.entities().unwrap_or(&[]);
    let source = msg
        .reply_to_message()
        .map(ReplySource::from_message)
        .unwrap_or(ReplySource::None);

    let draft = match classify(text, entities, &source) {
        Ok(draft) => draft,
        Err(e) => {
            reply_html(&bot, &msg, &html_escape(&e.to_string())).await?;
            return Ok(());
        }
    };

    let keyword = draft.keyword.clone();
    let kind = draft.kind;
    state.filters.add(draft.into_record(chat_id.0)).await?;
    info!("Added {:?} filter '{}' in chat {}", kind, keyword, chat_id);

    let chat_name = state.chat_name(&bot, chat_id).await;
    reply_html(
        &bot,
        &msg,
        &format!(
            "Handler '{}' added in <b>{}</b>!",
            html_escape(&keyword),
            html_escape(&chat_name)
        ),
    )
    .await
}

/// Handle /stop command - remove a filter by its exact keyword.
pub async fn stop_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(chat_id) = managed_chat(&bot, &msg, &state, true).await? else {
        return Ok(());
    };

    let keyword = args.trim();

    if keyword.is_empty() {
        reply_html(&bot, &msg, "Usage: /stop &lt;filter keyword&gt;").await?;
        return Ok(());
    }

    if state.filters.keywords(chat_id.0).await?.is_empty() {
        reply_html(&bot, &msg, "No filters are active here!").await?;
        return Ok(());
    }

    if state.filters.remove(chat_id.0, keyword).await? {
        info!("Removed filter '{}' from chat {}", keyword, chat_id);
        let chat_name = state.chat_name(&bot, chat_id).await;
        reply_html(
            &bot,
            &msg,
            &format!("Yep, I'll stop replying to that in <b>{}</b>.", html_escape(&chat_name)),
        )
        .await
    } else {
        reply_html(
            &bot,
            &msg,
            "That's not a current filter - run /filters for all active filters.",
        )
        .await
    }
}

/// Handle /stopall command - remove every filter of the chat.
pub async fn stopall_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(chat_id) = managed_chat(&bot, &msg, &state, true).await? else {
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if !state.permissions.is_creator(chat_id, user.id).await? {
        reply_html(&bot, &msg, "Only the chat creator can remove all filters at once.").await?;
        return Ok(());
    }

    let removed = state.filters.remove_chat(chat_id.0).await?;
    if removed == 0 {
        reply_html(&bot, &msg, "No filters are active here!").await?;
        return Ok(());
    }

    info!("Cleared all {} filters from chat {}", removed, chat_id);
    let chat_name = state.chat_name(&bot, chat_id).await;
    reply_html(
        &bot,
        &msg,
        &format!("Removed {} filters from <b>{}</b>.", removed, html_escape(&chat_name)),
    )
    .await
}

/// Handle /filters command - list filters, 10 per page.
pub async fn filters_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(chat_id) = managed_chat(&bot, &msg, &state, false).await? else {
        return Ok(());
    };

    let keywords = state.filters.keywords(chat_id.0).await?;
    let chat_name = state.chat_name(&bot, chat_id).await;

    let Some(page) = paginate(&keywords, parse_page_arg(args.split_whitespace().next())) else {
        reply_html(&bot, &msg, &format!("No filters in {}!", html_escape(&chat_name))).await?;
        return Ok(());
    };

    let mut req = bot
        .send_message(msg.chat.id, page.render(&chat_name))
        .parse_mode(ParseMode::Html)
        .reply_parameters(teloxide::types::ReplyParameters::new(msg.id));
    if let Some(kb) = page.keyboard(chat_id.0) {
        req = req.reply_markup(kb);
    }
    req.await?;

    Ok(())
}

/// Handle `filters_*` navigation callbacks - edit the listing in place.
pub async fn filters_callback(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let token: CallbackToken = match data.parse() {
        Ok(token) => token,
        Err(e) => {
            bot.answer_callback_query(&q.id).text(e.to_string()).await?;
            return Ok(());
        }
    };

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let (message_chat, message_id) = (message.chat().id, message.id());

    // Standing is checked where the listing is shown
    if !state.permissions.is_admin(message_chat, q.from.id).await? {
        bot.answer_callback_query(&q.id)
            .text("You need to be an admin to view filters.")
            .await?;
        return Ok(());
    }

    let keywords = state.filters.keywords(token.chat_id).await?;
    let Some(page) = paginate(&keywords, token.target_page()) else {
        bot.edit_message_text(message_chat, message_id, "No filters in this chat!")
            .await?;
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    let chat_name = state.chat_name(&bot, ChatId(token.chat_id)).await;
    let mut req = bot
        .edit_message_text(message_chat, message_id, page.render(&chat_name))
        .parse_mode(ParseMode::Html);
    if let Some(kb) = page.keyboard(token.chat_id) {
        req = req.reply_markup(kb);
    }

    match req.await {
        Ok(_) => {
            bot.answer_callback_query(&q.id).await?;
        }
        Err(e) => {
            error!("Error in filters pagination for chat {}: {}", token.chat_id, e);
            bot.answer_callback_query(&q.id)
                .text("Error updating filters list.")
                .await?;
        }
    }

    Ok(())
}

/// Handle /stats command - bot-wide filter statistics (owners only).
pub async fn stats_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let is_owner = msg.from.as_ref().is_some_and(|u| state.is_owner(u.id.0));
    if !is_owner {
        return Ok(());
    }

    let filters = state.filters.count_filters().await?;
    let chats = state.filters.count_chats().await?;
    reply_html(&bot, &msg, &stats_summary(filters, chats)).await
}

/// Handle /settings command - per-chat settings summary.
pub async fn settings_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(chat_id) = managed_chat(&bot, &msg, &state, true).await? else {
        return Ok(());
    };

    let count = state.filters.keywords(chat_id.0).await?.len();
    let chat_name = state.chat_name(&bot, chat_id).await;
    reply_html(
        &bot,
        &msg,
        &format!(
            "<b>Settings for {}</b>\n{}",
            html_escape(&chat_name),
            settings_summary(count)
        ),
    )
    .await
}
