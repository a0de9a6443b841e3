//! Permission checker with caching.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// A user's standing in a chat, as far as filter management cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    Creator,
    Admin,
    Member,
    /// Left, kicked or never joined.
    Outside,
}

impl Standing {
    fn from_kind(kind: &ChatMemberKind) -> Self {
        match kind {
            ChatMemberKind::Owner(_) => Self::Creator,
            ChatMemberKind::Administrator(_) => Self::Admin,
            ChatMemberKind::Left | ChatMemberKind::Banned(_) => Self::Outside,
            _ => Self::Member,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Creator | Self::Admin)
    }
}

/// Cache key for standing lookups.
type StandingCacheKey = (i64, u64); // (chat_id, user_id)

/// Permission checker with caching support.
///
/// Bot owners (from OWNER_IDS env) bypass every check. In private chats
/// the user is always considered an admin of their own chat.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<StandingCacheKey, Standing>,
    owner_ids: Vec<u64>,
}

impl Permissions {
    pub fn with_owners(bot: Bot, cache_registry: Arc<CacheRegistry>, owner_ids: Vec<u64>) -> Self {
        let cache = cache_registry.get_or_create(
            "admin_permissions",
            CacheConfig::with_capacity(10_000)
                .ttl(Duration::from_secs(300)) // 5 minutes
                .tti(Duration::from_secs(120)), // 2 minutes idle
        );

        Self { bot, cache, owner_ids }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Look up a user's standing, served from cache when possible.
    pub async fn standing(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<Standing> {
        let cache_key = (chat_id.0, user_id.0);

        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Standing cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let standing = Standing::from_kind(&member.kind);
        self.cache.insert(cache_key, standing);

        Ok(standing)
    }

    /// Check if a user is an admin (including the creator).
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) || chat_id.is_user() {
            return Ok(true);
        }
        Ok(self.standing(chat_id, user_id).await?.is_admin())
    }

    /// Check if a user created the chat.
    pub async fn is_creator(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) || chat_id.is_user() {
            return Ok(true);
        }
        Ok(self.standing(chat_id, user_id).await? == Standing::Creator)
    }

    /// Check if a user is currently in the chat.
    pub async fn is_member(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(true);
        }
        Ok(self.standing(chat_id, user_id).await? != Standing::Outside)
    }

    /// Forget every cached standing in a chat, e.g. after a migration.
    pub fn invalidate_chat(&self, chat_id: ChatId) {
        self.cache.invalidate_where(|(chat, _)| *chat == chat_id.0);
        debug!("Invalidated standings in chat {}", chat_id);
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::ChatMemberKind;

    use super::*;

    #[test]
    fn test_standing_from_kind() {
        assert_eq!(Standing::from_kind(&ChatMemberKind::Left), Standing::Outside);
        assert!(Standing::Creator.is_admin());
        assert!(Standing::Admin.is_admin());
        assert!(!Standing::Member.is_admin());
        assert!(!Standing::Outside.is_admin());
    }

    #[tokio::test]
    async fn test_private_chat_and_owner_bypass() {
        let perms = Permissions::with_owners(
            Bot::new("0:test"),
            Arc::new(CacheRegistry::new()),
            vec![42],
        );

        // No network: both short-circuit before any API call
        assert!(perms.is_admin(ChatId(7), UserId(7)).await.unwrap());
        assert!(perms.is_creator(ChatId(-1001), UserId(42)).await.unwrap());
        assert!(perms.is_member(ChatId(-1001), UserId(42)).await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_standing_is_used() {
        let registry = Arc::new(CacheRegistry::new());
        let perms = Permissions::with_owners(Bot::new("0:test"), registry, vec![]);

        perms.cache.insert((-1001, 5), Standing::Admin);
        assert!(perms.is_admin(ChatId(-1001), UserId(5)).await.unwrap());
        assert!(!perms.is_creator(ChatId(-1001), UserId(5)).await.unwrap());

        perms.invalidate_chat(ChatId(-1001));
        assert!(perms.cache.get(&(-1001, 5)).is_none());
    }
}
