use crate::cache::{EntryStore, StoreKey, StoredEntry};
use crate::error::CacheError;
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Non-persistent store, optionally bounded with least-recently-used eviction.
pub struct MemoryStore {
    inner: Arc<RwLock<LruCache<StoreKey, StoredEntry>>>,
    entry_count: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_lru(LruCache::unbounded())
    }

    pub fn with_capacity(max_entries: NonZeroUsize) -> Self {
        Self::from_lru(LruCache::new(max_entries))
    }

    fn from_lru(lru: LruCache<StoreKey, StoredEntry>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(lru)),
            entry_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        // `LruCache::get` promotes the entry, so it needs the write lock
        let mut cache = self.inner.write().await;
        Ok(cache.get(key).cloned())
    }

    async fn upsert(&self, entry: StoredEntry) -> Result<(), CacheError> {
        if entry.key.is_empty() {
            return Err(CacheError::InvalidKey("empty key".to_string()));
        }

        let key = entry.key.clone();
        let mut cache = self.inner.write().await;
        if let Some((evicted, _)) = cache.push(key.clone(), entry) {
            if evicted != key {
                tracing::debug!("Evicted least recently used entry {}", evicted);
            }
        }
        self.entry_count.store(cache.len(), Ordering::Relaxed);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut cache = self.inner.write().await;
        cache.pop(key);
        self.entry_count.store(cache.len(), Ordering::Relaxed);
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut cache = self.inner.write().await;

        let expired: Vec<StoreKey> = cache
            .iter()
            .filter(|(_, entry)| entry.created_at <= cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            cache.pop(key);
        }
        self.entry_count.store(cache.len(), Ordering::Relaxed);

        Ok(expired.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut cache = self.inner.write().await;
        cache.clear();
        self.entry_count.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }
}
