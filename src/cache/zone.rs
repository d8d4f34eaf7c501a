use crate::cache::{cutoff_for, CacheStats, EntryStore, StoredEntry};
use crate::error::CacheError;
use crate::zone::ZoneRecord;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Persistent per-ZIP derived metrics, keyed by zone id.
pub struct ZoneMetricsCache {
    store: Arc<dyn EntryStore>,
    lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl ZoneMetricsCache {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub async fn load(&self, zone_id: &str, ttl: Duration) -> Result<Option<ZoneRecord>, CacheError> {
        self.load_at(zone_id, ttl, Utc::now()).await
    }

    pub async fn load_at(
        &self,
        zone_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<ZoneRecord>, CacheError> {
        let entry = {
            let _guard = self.lock.lock().await;
            self.store.get(zone_id).await?
        };

        let Some(entry) = entry.filter(|e| e.is_fresh(ttl, now)) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        match serde_json::from_value::<ZoneRecord>(entry.payload) {
            Ok(record) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(record))
            }
            Err(e) => {
                // An unreadable record is recomputed rather than failing the zone.
                tracing::warn!(zone = zone_id, "Discarding malformed zone record: {}", e);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Replace the whole record for `zone_id`; last writer wins.
    pub async fn save(&self, zone_id: &str, record: &ZoneRecord) -> Result<(), CacheError> {
        self.save_at(zone_id, record, Utc::now()).await
    }

    pub async fn save_at(
        &self,
        zone_id: &str,
        record: &ZoneRecord,
        created_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_value(record)?;
        let _guard = self.lock.lock().await;
        self.store
            .upsert(StoredEntry::at(zone_id, payload, created_at))
            .await?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn purge_expired(&self, ttl: Duration) -> Result<usize, CacheError> {
        let _guard = self.lock.lock().await;
        self.store.purge_older_than(cutoff_for(ttl, Utc::now())).await
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entry_count: self.store.len(),
        }
    }
}
