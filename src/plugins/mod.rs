//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod connection;
pub mod filters;
pub mod help;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use teloxide::utils::command::BotCommands;

use crate::bot::ThrottledBot;
use crate::filters::CALLBACK_PREFIX;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Show help")]
    Help,

    // Filter commands
    #[command(description = "Add a keyword filter")]
    Filter(String),

    #[command(description = "List filters")]
    Filters(String),

    #[command(description = "Remove a filter")]
    Stop(String),

    #[command(description = "Remove all filters")]
    Stopall,

    #[command(description = "Filter settings of this chat")]
    Settings,

    #[command(description = "Filter statistics (owners)")]
    Stats,

    // Connection commands
    #[command(description = "Connect to a group")]
    Connect(String),

    #[command(description = "Disconnect from the group")]
    Disconnect,

    #[command(description = "Show the current connection")]
    Connection,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_handler))
        .branch(case![Command::Help].endpoint(help::help_handler))
        // Filters
        .branch(case![Command::Filter(args)].endpoint(filters::filter_command))
        .branch(case![Command::Filters(args)].endpoint(filters::filters_command))
        .branch(case![Command::Stop(args)].endpoint(filters::stop_command))
        .branch(case![Command::Stopall].endpoint(filters::stopall_command))
        .branch(case![Command::Settings].endpoint(filters::settings_command))
        .branch(case![Command::Stats].endpoint(filters::stats_command))
        // Connections
        .branch(case![Command::Connect(args)].endpoint(connection::connect_command))
        .branch(case![Command::Disconnect].endpoint(connection::disconnect_command))
        .branch(case![Command::Connection].endpoint(connection::connection_command))
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().branch(
        dptree::filter(|q: CallbackQuery| {
            q.data
                .as_ref()
                .map(|d| d.starts_with(CALLBACK_PREFIX))
                .unwrap_or(false)
        })
        .endpoint(filters::filters_callback),
    )
}

/// Reply to a message with HTML text.
pub(crate) async fn reply_html(bot: &ThrottledBot, msg: &Message, text: &str) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert!(matches!(
            Command::parse("/filters 2", "keyfilter_bot"),
            Ok(Command::Filters(args)) if args == "2"
        ));
        assert!(matches!(
            Command::parse("/stop Hello There", "keyfilter_bot"),
            Ok(Command::Stop(args)) if args == "Hello There"
        ));
        assert!(matches!(
            Command::parse("/connect -100123", "keyfilter_bot"),
            Ok(Command::Connect(args)) if args == "-100123"
        ));
    }
}
