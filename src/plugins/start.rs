//! /start command plugin.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::{AppState, ThrottledBot};

/// Handle the /start command.
pub async fn start_handler(bot: ThrottledBot, msg: Message, _state: AppState) -> anyhow::Result<()> {
    let text = "<b>Hi!</b> 👋

I reply to keywords with saved messages, stickers and media.
Add me to a group and use /filter to get started, or /help for every command.";

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}
