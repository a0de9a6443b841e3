//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's built-in axum webhook support to:
//! - Automatically call `setWebhook` on Telegram
//! - Spawn an axum HTTP server to receive updates
//! - Automatically call `deleteWebhook` on shutdown

use std::net::SocketAddr;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::{Config, ConfigError};

/// Start the bot in webhook mode.
///
/// On shutdown (Ctrl+C), the webhook is automatically deleted.
pub async fn start_webhook(
    config: &Config,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .ok_or(ConfigError::WebhookUrlMissing)?;

    let url = Url::parse(webhook_url).map_err(|_| ConfigError::Invalid {
        name: "WEBHOOK_URL",
        value: webhook_url.to_string(),
    })?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url.clone());
    if let Some(ref secret) = config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    info!("Setting webhook URL: {}", url);
    info!("Listening on: {}", address);

    // Webhook setup only needs the bare Bot, not the Throttle adaptor
    let listener = webhooks::axum(bot.inner().clone(), options)
        .await
        .context("failed to set up webhook")?;

    info!("Webhook setup complete, waiting for updates...");

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}
