//! Filter repository with tiered caching.
//!
//! L1 caches the ordered keyword list of a chat (scanned on every message),
//! L2 caches the content of individual filters (read only on a match).

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{FindOptions, IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::FilterStore;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{ContentKind, Database, FilterButton, FilterRecord, LegacyFlags};

/// Repository for filters stored in MongoDB.
pub struct FilterRepository {
    collection: Collection<FilterRecord>,
    /// L1 Cache: ChatID -> keywords in storage order
    keywords_cache: TypedCache<i64, Vec<String>>,
    /// L2 Cache: (ChatID, keyword) -> filter content
    filter_cache: TypedCache<(i64, String), FilterRecord>,
}

/// A document written by the old schema, before `kind` existed.
#[derive(Debug, Deserialize)]
struct LegacyFilterDoc {
    #[serde(rename = "_id")]
    id: Bson,
    keyword: String,
    #[serde(flatten)]
    flags: LegacyFlags,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    buttons: Vec<FilterButton>,
}

impl FilterRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let keywords_cache = cache.get_or_create("filter_keywords", CacheConfig::cold_data());

        let filter_cache = cache.get_or_create(
            "filter_content",
            CacheConfig::hot_data() // 1 min TTL
                .max_capacity(10_000),
        );

        Self {
            collection: db.collection("filters"),
            keywords_cache,
            filter_cache,
        }
    }

    /// Create the unique `(chat_id, keyword)` index.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "chat_id": 1, "keyword": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        debug!("Ensured filters index");
        Ok(())
    }

    /// Convert documents still carrying the old boolean content flags.
    ///
    /// Documents with more than one media flag set cannot be mapped to a
    /// single kind and are deleted. Returns `(converted, rejected)`.
    pub async fn migrate_legacy_records(&self) -> Result<(u64, u64)> {
        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let mut cursor = raw_coll.find(doc! { "kind": { "$exists": false } }).await?;

        let mut converted = 0;
        let mut rejected = 0;

        while let Some(result) = cursor.next().await {
            let legacy: LegacyFilterDoc = match result.map(bson::from_document) {
                Ok(Ok(legacy)) => legacy,
                Ok(Err(e)) => {
                    warn!("Skipping unreadable legacy filter: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match ContentKind::from_legacy_flags(&legacy.flags) {
                Ok(kind) => {
                    let buttons = if kind.supports_buttons() { legacy.buttons } else { vec![] };
                    let unset: Document = LegacyFlags::FIELDS
                        .iter()
                        .map(|field| (field.to_string(), Bson::String(String::new())))
                        .collect();

                    raw_coll
                        .update_one(
                            doc! { "_id": legacy.id },
                            doc! {
                                "$set": {
                                    "kind": bson::to_bson(&kind)?,
                                    "keyword": legacy.keyword.to_lowercase(),
                                    "buttons": bson::to_bson(&buttons)?,
                                    "created_at": legacy.created_at.unwrap_or(0),
                                },
                                "$unset": unset,
                            },
                        )
                        .await?;
                    converted += 1;
                }
                Err(e) => {
                    warn!("Rejecting legacy filter '{}': {}", legacy.keyword, e);
                    raw_coll.delete_one(doc! { "_id": legacy.id }).await?;
                    rejected += 1;
                }
            }
        }

        if converted + rejected > 0 {
            info!("Legacy filters: {} converted, {} rejected", converted, rejected);
            self.keywords_cache.invalidate_where(|_| true);
            self.filter_cache.invalidate_where(|_| true);
        }

        Ok((converted, rejected))
    }

    /// Helper to fetch keywords from DB.
    async fn fetch_keywords_from_db(&self, chat_id: i64) -> Result<Vec<String>> {
        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let options = FindOptions::builder()
            .projection(doc! { "keyword": 1, "_id": 0 })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();

        let mut cursor = raw_coll
            .find(doc! { "chat_id": chat_id })
            .with_options(options)
            .await?;
        let mut keywords = Vec::new();

        while let Some(result) = cursor.next().await {
            if let Ok(keyword) = result?.get_str("keyword") {
                keywords.push(keyword.to_string());
            }
        }
        Ok(keywords)
    }

    fn invalidate_chat(&self, chat_id: i64) {
        self.keywords_cache.invalidate(&chat_id);
        self.filter_cache.invalidate_where(|(chat, _)| *chat == chat_id);
    }
}

#[async_trait]
impl FilterStore for FilterRepository {
    async fn add(&self, record: FilterRecord) -> Result<()> {
        let keyword = record.keyword.to_lowercase();
        let filter_doc = doc! {
            "chat_id": record.chat_id,
            "keyword": keyword.as_str(),
        };
        let update = doc! {
            "$set": {
                "reply": record.reply.as_str(),
                "kind": bson::to_bson(&record.kind)?,
                "buttons": bson::to_bson(&record.buttons)?,
            },
            "$setOnInsert": { "created_at": record.created_at },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(filter_doc, update)
            .with_options(options)
            .await?;

        // Content and possibly the keyword list changed
        self.filter_cache.invalidate(&(record.chat_id, keyword));
        self.keywords_cache.invalidate(&record.chat_id);

        Ok(())
    }

    async fn remove(&self, chat_id: i64, keyword: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "chat_id": chat_id, "keyword": keyword })
            .await?;

        if result.deleted_count > 0 {
            self.filter_cache.invalidate(&(chat_id, keyword.to_string()));
            self.keywords_cache.invalidate(&chat_id);
            return Ok(true);
        }

        Ok(false)
    }

    async fn get(&self, chat_id: i64, keyword: &str) -> Result<Option<FilterRecord>> {
        let key = (chat_id, keyword.to_lowercase());

        if let Some(filter) = self.filter_cache.get(&key) {
            debug!("Filter '{}' served from cache", key.1);
            return Ok(Some(filter));
        }

        let result = self
            .collection
            .find_one(doc! { "chat_id": chat_id, "keyword": key.1.as_str() })
            .await?;

        if let Some(f) = &result {
            self.filter_cache.insert(key, f.clone());
        }

        Ok(result)
    }

    async fn keywords(&self, chat_id: i64) -> Result<Vec<String>> {
        if let Some(keywords) = self.keywords_cache.get(&chat_id) {
            return Ok(keywords);
        }

        let keywords = self.fetch_keywords_from_db(chat_id).await?;
        self.keywords_cache.insert(chat_id, keywords.clone());
        Ok(keywords)
    }

    async fn count_filters(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn count_chats(&self) -> Result<u64> {
        Ok(self.collection.distinct("chat_id", doc! {}).await?.len() as u64)
    }

    async fn migrate_chat(&self, old_chat_id: i64, new_chat_id: i64) -> Result<u64> {
        // Clear same-keyword records in the target first, the unique index
        // would otherwise stop update_many partway through
        let moved = self.fetch_keywords_from_db(old_chat_id).await?;
        if moved.is_empty() {
            return Ok(0);
        }
        let cleared = self
            .collection
            .delete_many(doc! { "chat_id": new_chat_id, "keyword": { "$in": moved } })
            .await?;
        if cleared.deleted_count > 0 {
            debug!(
                "Replacing {} filters already in {} during migration",
                cleared.deleted_count, new_chat_id
            );
        }

        let result = self
            .collection
            .update_many(
                doc! { "chat_id": old_chat_id },
                doc! { "$set": { "chat_id": new_chat_id } },
            )
            .await?;

        self.invalidate_chat(old_chat_id);
        self.invalidate_chat(new_chat_id);

        info!(
            "Migrated {} filters from {} to {}",
            result.modified_count, old_chat_id, new_chat_id
        );
        Ok(result.modified_count)
    }

    async fn remove_chat(&self, chat_id: i64) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "chat_id": chat_id }).await?;
        self.invalidate_chat(chat_id);
        Ok(result.deleted_count)
    }
}
