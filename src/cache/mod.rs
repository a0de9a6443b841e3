//! Cache module - named, typed caches on top of Moka.
//!
//! Every hot lookup in the bot (keyword lists, filter content, admin
//! standing, chat titles, compiled keyword patterns) goes through a
//! `TypedCache` obtained from the shared `CacheRegistry`:
//!
//! ```rust,ignore
//! let keywords: TypedCache<i64, Vec<String>> =
//!     registry.get_or_create("filter_keywords", CacheConfig::cold_data());
//! keywords.insert(chat_id, list);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
