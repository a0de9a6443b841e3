//! In-process filter store.
//!
//! Used when no MongoDB URI is configured, and by tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::FilterStore;
use crate::database::FilterRecord;

/// Filters kept in memory, one ordered list per chat.
#[derive(Default)]
pub struct MemoryFilterStore {
    chats: RwLock<HashMap<i64, Vec<FilterRecord>>>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Replace in place or append, keeping the first registration time.
fn upsert(list: &mut Vec<FilterRecord>, mut record: FilterRecord) {
    match list.iter_mut().find(|f| f.keyword == record.keyword) {
        Some(existing) => {
            record.created_at = existing.created_at;
            *existing = record;
        }
        None => list.push(record),
    }
}

#[async_trait]
impl FilterStore for MemoryFilterStore {
    async fn add(&self, mut record: FilterRecord) -> Result<()> {
        record.keyword = record.keyword.to_lowercase();
        let mut chats = self.chats.write();
        upsert(chats.entry(record.chat_id).or_default(), record);
        Ok(())
    }

    async fn remove(&self, chat_id: i64, keyword: &str) -> Result<bool> {
        let mut chats = self.chats.write();
        let Some(list) = chats.get_mut(&chat_id) else {
            return Ok(false);
        };

        let before = list.len();
        list.retain(|f| f.keyword != keyword);
        let removed = list.len() < before;

        if list.is_empty() {
            chats.remove(&chat_id);
        }
        Ok(removed)
    }

    async fn get(&self, chat_id: i64, keyword: &str) -> Result<Option<FilterRecord>> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .chats
            .read()
            .get(&chat_id)
            .and_then(|list| list.iter().find(|f| f.keyword == keyword).cloned()))
    }

    async fn keywords(&self, chat_id: i64) -> Result<Vec<String>> {
        Ok(self
            .chats
            .read()
            .get(&chat_id)
            .map(|list| list.iter().map(|f| f.keyword.clone()).collect())
            .unwrap_or_default())
    }

    async fn count_filters(&self) -> Result<u64> {
        Ok(self.chats.read().values().map(|l| l.len() as u64).sum())
    }

    async fn count_chats(&self) -> Result<u64> {
        Ok(self.chats.read().values().filter(|l| !l.is_empty()).count() as u64)
    }

    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> Result<u64> {
        let mut chats = self.chats.write();
        let Some(moved) = chats.remove(&old_chat_id) else {
            return Ok(0);
        };

        let count = moved.len() as u64;
        let target = chats.entry(new_chat_id).or_default();
        // Moved records replace same-keyword records already in the target
        target.retain(|existing| !moved.iter().any(|m| m.keyword == existing.keyword));
        target.extend(moved.into_iter().map(|mut record| {
            record.chat_id = new_chat_id;
            record
        }));

        debug!("Moved {} filters from {} to {}", count, old_chat_id, new_chat_id);
        Ok(count)
    }

    async fn remove_chat(&self, chat_id: i64) -> Result<u64> {
        Ok(self
            .chats
            .write()
            .remove(&chat_id)
            .map(|l| l.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ContentKind;

    fn text(chat_id: i64, keyword: &str, reply: &str) -> FilterRecord {
        FilterRecord::new(chat_id, keyword, reply, ContentKind::Text, vec![])
    }

    #[tokio::test]
    async fn test_keyword_stored_lowercase_once() {
        let store = MemoryFilterStore::new();
        let mut record = text(1, "x", "hi");
        record.keyword = "HeLLo".to_string();
        store.add(record).await.unwrap();

        assert_eq!(store.keywords(1).await.unwrap(), vec!["hello"]);
        assert!(store.get(1, "HELLO").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_re_register_overwrites_in_place() {
        let store = MemoryFilterStore::new();
        store.add(text(1, "a", "first")).await.unwrap();
        store.add(text(1, "b", "b")).await.unwrap();
        store.add(text(1, "A", "second")).await.unwrap();

        assert_eq!(store.keywords(1).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.count_filters().await.unwrap(), 2);
        assert_eq!(store.get(1, "a").await.unwrap().unwrap().reply, "second");
    }

    #[tokio::test]
    async fn test_remove_is_exact() {
        let store = MemoryFilterStore::new();
        store.add(text(1, "hello", "hi")).await.unwrap();

        assert!(!store.remove(1, "Hello").await.unwrap());
        assert!(!store.remove(1, "hell").await.unwrap());
        assert!(store.remove(1, "hello").await.unwrap());
        assert_eq!(store.count_chats().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let store = MemoryFilterStore::new();
        store.add(text(1, "a", "x")).await.unwrap();
        store.add(text(1, "b", "x")).await.unwrap();
        store.add(text(2, "a", "x")).await.unwrap();

        assert_eq!(store.count_filters().await.unwrap(), 3);
        assert_eq!(store.count_chats().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_migrate_chat_remaps_records() {
        let store = MemoryFilterStore::new();
        store.add(text(-1, "a", "x")).await.unwrap();
        store.add(text(-1, "b", "y")).await.unwrap();

        assert_eq!(store.migrate_chat(-1, -100).await.unwrap(), 2);
        assert!(store.keywords(-1).await.unwrap().is_empty());
        assert_eq!(store.keywords(-100).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.get(-100, "b").await.unwrap().unwrap().chat_id, -100);
    }

    #[tokio::test]
    async fn test_migrate_chat_replaces_conflicting_keywords() {
        let store = MemoryFilterStore::new();
        store.add(text(-100, "a", "stale")).await.unwrap();
        store.add(text(-100, "keep", "kept")).await.unwrap();
        store.add(text(-1, "a", "fresh")).await.unwrap();

        assert_eq!(store.migrate_chat(-1, -100).await.unwrap(), 1);
        assert_eq!(store.get(-100, "a").await.unwrap().unwrap().reply, "fresh");
        assert_eq!(store.get(-100, "keep").await.unwrap().unwrap().reply, "kept");
        assert_eq!(store.keywords(-100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_chat() {
        let store = MemoryFilterStore::new();
        store.add(text(1, "a", "x")).await.unwrap();
        store.add(text(1, "b", "x")).await.unwrap();

        assert_eq!(store.remove_chat(1).await.unwrap(), 2);
        assert_eq!(store.remove_chat(1).await.unwrap(), 0);
    }
}
