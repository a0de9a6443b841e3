//! Repository module - the keyword store behind the filters feature.

mod filter_repository;
mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::database::FilterRecord;

pub use filter_repository::FilterRepository;
pub use memory::MemoryFilterStore;

/// Per-chat keyword -> reply table.
///
/// Every operation is atomic on its own; callers never need a
/// read-modify-write sequence across calls.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Insert or replace the record for `(chat_id, keyword)`.
    ///
    /// Replacing keeps the keyword's original position in `keywords`.
    async fn add(&self, record: FilterRecord) -> Result<()>;

    /// Remove one filter. The keyword must match exactly.
    async fn remove(&self, chat_id: i64, keyword: &str) -> Result<bool>;

    async fn get(&self, chat_id: i64, keyword: &str) -> Result<Option<FilterRecord>>;

    /// All keywords of a chat in storage order.
    async fn keywords(&self, chat_id: i64) -> Result<Vec<String>>;

    async fn count_filters(&self) -> Result<u64>;

    /// Number of chats with at least one filter.
    async fn count_chats(&self) -> Result<u64>;

    /// Move every filter of `old_chat_id` to `new_chat_id`. A moved filter
    /// replaces one with the same keyword already in `new_chat_id`.
    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> Result<u64>;

    /// Remove every filter of a chat.
    async fn remove_chat(&self, chat_id: i64) -> Result<u64>;
}
