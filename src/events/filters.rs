//! Filter event handler.
//!
//! Scans incoming messages for registered keywords and sends the reply
//! of the first match.

use teloxide::prelude::*;
use teloxide::types::{
    InputFile, LinkPreviewOptions, MessageId, ParseMode, ReplyParameters,
};
use tracing::{debug, error, warn};

use crate::bot::{AppState, ThrottledBot};
use crate::config::ReplyAnchor;
use crate::database::{FilterButton, FilterRecord};
use crate::filters::{DeliveryFailure, Fallback, ReplyPlan, MALFORMED_FILTER_NOTICE};
use crate::utils::reply_markup;

/// Check a message against the chat's filters - called from the event handlers.
pub async fn check_filters(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(text) = match_text(msg) else {
        return Ok(());
    };

    // Ignore commands
    if text.starts_with('/') {
        return Ok(());
    }

    let chat_id = msg.chat.id;

    // L1 Cache: ordered keyword list
    let keywords = state.filters.keywords(chat_id.0).await?;
    if keywords.is_empty() {
        return Ok(());
    }

    let Some(keyword) = state.matcher.first_match(&keywords, text) else {
        return Ok(());
    };
    debug!("Filter '{}' matched in chat {}", keyword, chat_id);

    // L2 Cache: the content of the matched filter
    let Some(record) = state.filters.get(chat_id.0, keyword).await? else {
        // Removed between the two reads
        return Ok(());
    };

    let reply_to = reply_target(msg, state.reply_anchor);
    send_filter(bot, chat_id, reply_to, &record).await
}

/// Text a message is matched against: text, caption, or a sticker's emoji.
fn match_text(msg: &Message) -> Option<&str> {
    msg.text()
        .or_else(|| msg.caption())
        .or_else(|| msg.sticker().and_then(|s| s.emoji.as_deref()))
        .filter(|t| !t.is_empty())
}

fn reply_target(msg: &Message, anchor: ReplyAnchor) -> MessageId {
    match anchor {
        ReplyAnchor::Trigger => msg.id,
        ReplyAnchor::Replied => msg.reply_to_message().map_or(msg.id, |r| r.id),
    }
}

fn preview_options(disabled: bool) -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: disabled,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Send the reply of a matched filter.
async fn send_filter(
    bot: &ThrottledBot,
    chat_id: ChatId,
    reply_to: MessageId,
    record: &FilterRecord,
) -> anyhow::Result<()> {
    let reply = ReplyParameters::new(reply_to);

    match ReplyPlan::for_record(record) {
        ReplyPlan::Sticker(file_id) => {
            bot.send_sticker(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply)
                .await?;
        }
        ReplyPlan::Document(file_id) => {
            bot.send_document(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply)
                .await?;
        }
        ReplyPlan::Image { file_id, buttons } => {
            let mut req = bot
                .send_photo(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply);
            if let Some(kb) = reply_markup(buttons) {
                req = req.reply_markup(kb);
            }
            req.await?;
        }
        ReplyPlan::Audio(file_id) => {
            bot.send_audio(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply)
                .await?;
        }
        ReplyPlan::Voice(file_id) => {
            bot.send_voice(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply)
                .await?;
        }
        ReplyPlan::Video(file_id) => {
            bot.send_video(chat_id, InputFile::file_id(file_id.to_string()))
                .reply_parameters(reply)
                .await?;
        }
        ReplyPlan::Text {
            body,
            disable_preview,
            buttons,
        } => {
            send_text(bot, chat_id, reply_to, record, body, disable_preview, buttons).await?;
        }
        ReplyPlan::Legacy(text) => {
            bot.send_message(chat_id, text).reply_parameters(reply).await?;
        }
    }

    Ok(())
}

/// Send a formatted filter, degrading on delivery failures.
async fn send_text(
    bot: &ThrottledBot,
    chat_id: ChatId,
    reply_to: MessageId,
    record: &FilterRecord,
    body: &str,
    disable_preview: bool,
    buttons: &[FilterButton],
) -> anyhow::Result<()> {
    let markup = reply_markup(buttons);

    let mut req = bot
        .send_message(chat_id, body)
        .parse_mode(ParseMode::Html)
        .link_preview_options(preview_options(disable_preview))
        .reply_parameters(ReplyParameters::new(reply_to));
    if let Some(kb) = markup.clone() {
        req = req.reply_markup(kb);
    }

    let Err(err) = req.await else {
        return Ok(());
    };

    let Some(failure) = DeliveryFailure::classify(&err) else {
        return Err(err.into());
    };

    match failure.fallback() {
        Fallback::Notice(notice) => {
            warn!(
                "Filter '{}' in chat {} was refused ({:?}), sending notice",
                record.keyword, chat_id, failure
            );
            bot.send_message(chat_id, notice)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
        Fallback::ResendWithoutReply => {
            warn!(
                "Reply target of filter '{}' in chat {} is gone, sending without reply",
                record.keyword, chat_id
            );
            let mut req = bot
                .send_message(chat_id, body)
                .parse_mode(ParseMode::Html)
                .link_preview_options(preview_options(true));
            if let Some(kb) = markup {
                req = req.reply_markup(kb);
            }
            req.await?;
        }
        Fallback::MalformedNotice => {
            error!(
                "Could not send filter '{}' in chat {}: {}",
                record.keyword, chat_id, err
            );
            bot.send_message(chat_id, MALFORMED_FILTER_NOTICE)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        }
    }

    Ok(())
}
