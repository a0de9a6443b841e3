//! Typed cache wrapper around Moka.

use std::hash::Hash;
use std::sync::Arc;

use moka::sync::Cache;

use super::CacheConfig;

/// A named cache with a small API over Moka.
///
/// Cloning is cheap and shares the same underlying cache.
pub struct TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
    name: Arc<str>,
}

// Manual Clone: moka's Cache is already an Arc handle, K and V need not be Clone.
impl<K, V> Clone for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            name: Arc::clone(&self.name),
        }
    }
}

impl<K, V> TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new typed cache with the given name and config.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        Self {
            inner: builder.build(),
            name: name.into(),
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Returns `Some(value)` if the key exists and hasn't expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.invalidate(key);
    }

    /// Drop every entry matching `predicate`.
    ///
    /// Evaluated eagerly over the current entries; used when a whole chat
    /// is migrated or cleared and per-key invalidation is not possible.
    pub fn invalidate_where<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool,
    {
        let doomed: Vec<Arc<K>> = self
            .inner
            .iter()
            .filter(|(k, _)| predicate(k))
            .map(|(k, _)| k)
            .collect();

        for key in doomed {
            self.inner.invalidate(key.as_ref());
        }
    }
}

impl<K, V> std::fmt::Debug for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCache")
            .field("name", &self.name)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_where() {
        let cache: TypedCache<(i64, String), u32> = TypedCache::new("t", CacheConfig::default());
        cache.insert((1, "a".into()), 1);
        cache.insert((1, "b".into()), 2);
        cache.insert((2, "a".into()), 3);

        cache.invalidate_where(|(chat, _)| *chat == 1);

        assert!(cache.get(&(1, "a".into())).is_none());
        assert!(cache.get(&(1, "b".into())).is_none());
        assert_eq!(cache.get(&(2, "a".into())), Some(3));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache: TypedCache<i64, String> = TypedCache::new("t", CacheConfig::default());
        let other = cache.clone();

        cache.insert(1, "one".into());
        assert_eq!(other.get(&1).as_deref(), Some("one"));

        other.invalidate(&1);
        assert!(cache.get(&1).is_none());
    }
}
