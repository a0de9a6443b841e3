//! /help command plugin.

use teloxide::prelude::*;

use super::reply_html;
use crate::bot::{AppState, ThrottledBot};

pub const HELP_TEXT: &str = "<b>Filters</b>

 - /filters [page]: list the filters of this chat, 10 per page.

<b>Admin only:</b>
 - /filter &lt;keyword&gt; &lt;reply&gt;: reply with that message whenever 'keyword' is mentioned. \
Reply to a sticker, document, photo, audio, voice or video with /filter &lt;keyword&gt; to reply with it instead. \
Keywords are lowercase; quote them to use a sentence, eg: /filter \"hey there\" How you doin?
 - Buttons: <code>[Label](buttonurl://example.com)</code>, add <code>:same</code> before the closing bracket to keep it on the previous row.
 - /stop &lt;keyword&gt;: stop that filter.
 - /stopall: remove every filter (chat creator only).
 - /settings: show this chat's filter settings.

<b>Connections:</b>
 - /connect &lt;chat id&gt;: manage a group's filters from this private chat.
 - /disconnect, /connection: drop or show the current connection.";

/// Handle the /help command.
pub async fn help_handler(bot: ThrottledBot, msg: Message, _state: AppState) -> anyhow::Result<()> {
    reply_html(&bot, &msg, HELP_TEXT).await
}
