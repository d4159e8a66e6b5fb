//! Freshness-bounded result cache shared by the query wrappers

use super::key::QueryKey;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::Instant;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

/// Thread-safe map from [`QueryKey`] to the last successful result
///
/// Entries hold values of different types; a lookup with the wrong type is a
/// miss.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key` if younger than `stale_time`
    pub fn get_fresh<T>(&self, key: &QueryKey, stale_time: std::time::Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.read();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= stale_time {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub fn insert<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.write().insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop `prefix` and every key it prefixes; returns how many were removed
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
