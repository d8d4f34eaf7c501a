use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type StoreKey = String;

/// A persisted value together with the moment it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: StoreKey,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn new(key: impl Into<StoreKey>, payload: serde_json::Value) -> Self {
        Self::at(key, payload, Utc::now())
    }

    pub fn at(key: impl Into<StoreKey>, payload: serde_json::Value, created_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            payload,
            created_at,
        }
    }

    /// An entry is fresh while `now - created_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            // Larger than chrono can represent: never expires.
            return true;
        };
        now.signed_duration_since(self.created_at) < ttl
    }
}

/// Key/value table backing one cache tier
#[async_trait::async_trait]
pub trait EntryStore: Send + Sync + 'static {
    /// Get an entry by key, regardless of age
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;

    /// Insert or fully replace the entry stored under `entry.key`
    async fn upsert(&self, entry: StoredEntry) -> Result<(), CacheError>;

    /// Remove an entry
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry created before `cutoff`, returning how many were removed
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, CacheError>;

    /// Remove all entries
    async fn clear(&self) -> Result<(), CacheError>;

    /// Number of entries currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub entry_count: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub(crate) fn cutoff_for(ttl: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => now.checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC),
        Err(_) => DateTime::<Utc>::MIN_UTC,
    }
}

pub mod disk;
pub mod memory;
pub mod response;
pub mod zone;
