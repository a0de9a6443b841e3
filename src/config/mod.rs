//! Configuration module for the keyfilter bot.
//!
//! Loads configuration from environment variables.

use std::env;

use serde::Deserialize;
use thiserror::Error;

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Which message a filter reply is attached to when the triggering
/// message is itself a reply to someone else.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyAnchor {
    /// Reply to the message that contained the keyword.
    #[default]
    Trigger,
    /// Reply to the message the trigger was answering.
    Replied,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("WEBHOOK_URL must be set when BOT_MODE is webhook")]
    WebhookUrlMissing,

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated)
    /// These users bypass admin checks and may run /stats.
    pub owner_ids: Vec<u64>,

    // MongoDB. Without a URI the bot keeps filters in memory.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    pub reply_anchor: ReplyAnchor,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            Some("webhook") => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::WebhookUrlMissing);
        }

        let webhook_port = match var("WEBHOOK_PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::Invalid {
                name: "WEBHOOK_PORT",
                value: port,
            })?,
            None => 8443,
        };

        let owner_ids = var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let reply_anchor = match var("FILTER_REPLY_ANCHOR").map(|a| a.to_lowercase()).as_deref() {
            None | Some("trigger") => ReplyAnchor::Trigger,
            Some("replied") => ReplyAnchor::Replied,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "FILTER_REPLY_ANCHOR",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            bot_token: var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: var("WEBHOOK_SECRET"),
            owner_ids,
            mongodb_uri: var("MONGODB_URI"),
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "keyfilter".to_string()),
            reply_anchor,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.webhook_port, 8443);
        assert_eq!(config.mongodb_database, "keyfilter");
        assert_eq!(config.reply_anchor, ReplyAnchor::Trigger);
        assert!(config.mongodb_uri.is_none());
        assert!(config.owner_ids.is_empty());
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn test_webhook_requires_url() {
        let err = load(&[("BOT_TOKEN", "t"), ("BOT_MODE", "Webhook")]).unwrap_err();
        assert_eq!(err, ConfigError::WebhookUrlMissing);
    }

    #[test]
    fn test_owner_ids_and_anchor() {
        let config = load(&[
            ("BOT_TOKEN", "t"),
            ("OWNER_IDS", "1, 2,oops,3"),
            ("FILTER_REPLY_ANCHOR", "REPLIED"),
        ])
        .unwrap();

        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.reply_anchor, ReplyAnchor::Replied);
    }

    #[test]
    fn test_invalid_anchor() {
        let err = load(&[("BOT_TOKEN", "t"), ("FILTER_REPLY_ANCHOR", "sideways")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "FILTER_REPLY_ANCHOR", .. }));
    }
}
