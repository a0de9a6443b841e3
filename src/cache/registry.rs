//! Cache registry - central management for all caches.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{CacheConfig, TypedCache};

/// Registry of named typed caches shared by the repositories,
/// the permission checker and the keyword matcher.
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Type-erased registry slot.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get an existing cache or create and register a new one.
    ///
    /// A name already registered with different key/value types is a
    /// programming error; it is logged and an unregistered cache is
    /// returned so the caller keeps working.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(existing) = caches.get(name) {
            if let Some(cache) = existing.cache.downcast_ref::<TypedCache<K, V>>() {
                return cache.clone();
            }
            warn!(
                "Cache '{}' already registered as {}, requested {}",
                name,
                existing.type_name,
                std::any::type_name::<TypedCache<K, V>>()
            );
            return TypedCache::new(name, config);
        }

        debug!("Creating cache: {}", name);
        let cache = TypedCache::new(name, config);
        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );

        cache
    }

    /// Names of all registered caches.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
