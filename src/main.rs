//! keyfilter - keyword-triggered auto-replies for Telegram group chats.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Filter records, MongoDB and in-memory keyword stores
//! - `cache` - Named typed caches with Moka
//! - `permissions` - Admin checking with caching
//! - `connections` - Managing a group's filters from a private chat
//! - `filters` - Classification, matching, delivery policy, pagination
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command and callback handlers
//! - `events` - Per-message filter scan, chat migration
//! - `utils` - Parsing and formatting helpers

mod bot;
mod cache;
mod config;
mod connections;
mod database;
mod events;
mod filters;
mod permissions;
mod plugins;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use cache::CacheRegistry;
use config::Config;
use database::{Database, FilterRepository, FilterStore, MemoryFilterStore};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keyfilter=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting keyfilter bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded, bot mode: {:?}", config.bot_mode);

    let cache = Arc::new(CacheRegistry::new());
    let filters = open_store(&config, &cache).await?;

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let state = AppState::new(
        &bot,
        filters,
        cache,
        config.owner_ids.clone(),
        config.reply_anchor,
    );
    info!("Caches: {:?}", state.cache.names());

    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    bot::run(&config, bot, dispatcher).await
}

/// Open MongoDB when configured, otherwise keep filters in memory.
async fn open_store(config: &Config, cache: &CacheRegistry) -> anyhow::Result<Arc<dyn FilterStore>> {
    let Some(uri) = config.mongodb_uri.as_deref() else {
        warn!("MONGODB_URI is not set, filters are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryFilterStore::new()));
    };

    info!("Connecting to MongoDB...");
    let db = Database::connect(uri, &config.mongodb_database).await?;

    let repo = FilterRepository::new(&db, cache);
    repo.ensure_indexes().await?;
    repo.migrate_legacy_records().await?;

    Ok(Arc::new(repo))
}
