//! Cache of raw upstream responses keyed by request fingerprint.

use crate::cache::{cutoff_for, CacheStats, EntryStore, StoredEntry};
use crate::error::{CacheError, FetchError};
use crate::http::HttpTransport;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Deterministic SHA-256 fingerprint of a request.
///
/// Parameters named in `secret_params` are ignored and the rest are sorted,
/// so credential rotation and parameter order never change the key.
pub fn fingerprint(endpoint: &str, params: &[(String, String)], secret_params: &[String]) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(name, _)| !secret_params.iter().any(|secret| secret == name))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable();

    let canonical = pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct ResponseCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

pub struct ResponseCache {
    store: Arc<dyn EntryStore>,
    transport: Arc<dyn HttpTransport>,
    lock: Mutex<()>,
    secret_params: Vec<String>,
    acceptable_statuses: Vec<String>,
    stats: ResponseCacheStats,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn EntryStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            store,
            transport,
            lock: Mutex::new(()),
            secret_params: vec!["key".to_string()],
            acceptable_statuses: vec!["OK".to_string(), "ZERO_RESULTS".to_string()],
            stats: ResponseCacheStats {
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                writes: AtomicU64::new(0),
            },
        }
    }

    pub fn with_secret_params(mut self, secret_params: Vec<String>) -> Self {
        self.secret_params = secret_params;
        self
    }

    pub fn with_acceptable_statuses(mut self, statuses: Vec<String>) -> Self {
        self.acceptable_statuses = statuses;
        self
    }

    pub fn fingerprint(&self, endpoint: &str, params: &[(String, String)]) -> String {
        fingerprint(endpoint, params, &self.secret_params)
    }

    /// Return a fresh cached payload, or call upstream and cache the result when acceptable.
    pub async fn get_or_fetch(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        ttl: Duration,
    ) -> Result<Value, FetchError> {
        let key = self.fingerprint(endpoint, params);

        if let Some(payload) = self.lookup_at(&key, ttl, Utc::now()).await? {
            tracing::debug!(endpoint, key = %key, "Response cache HIT");
            return Ok(payload);
        }
        tracing::debug!(endpoint, key = %key, "Response cache MISS");

        let response = self.transport.get(endpoint, params).await?;
        if !response.is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status,
                url: endpoint.to_string(),
            });
        }

        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Data(format!("{endpoint} returned invalid JSON: {e}")))?;

        if self.is_acceptable(&payload) {
            self.store_at(&key, payload.clone(), Utc::now()).await?;
        } else {
            tracing::debug!(
                endpoint,
                status = ?payload.get("status"),
                "Not caching response with unacceptable status"
            );
        }

        Ok(payload)
    }

    /// Whether a fresh payload for this request is already cached. Does not touch hit/miss counters.
    pub async fn is_fresh(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let key = self.fingerprint(endpoint, params);
        let _guard = self.lock.lock().await;
        let entry = self.store.get(&key).await?;
        Ok(entry.is_some_and(|e| e.is_fresh(ttl, Utc::now())))
    }

    /// Look up a fingerprint as of `now`, treating entries at least `ttl` old as absent.
    pub async fn lookup_at(
        &self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Value>, CacheError> {
        let entry = {
            let _guard = self.lock.lock().await;
            self.store.get(key).await?
        };

        match entry {
            Some(entry) if entry.is_fresh(ttl, now) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("zone_scout_response_cache_hits_total");
                Ok(Some(entry.payload))
            }
            _ => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("zone_scout_response_cache_misses_total");
                Ok(None)
            }
        }
    }

    /// Write a payload under `key` with the given creation time, replacing any previous entry.
    pub async fn store_at(
        &self,
        key: &str,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        self.store
            .upsert(StoredEntry::at(key, payload, created_at))
            .await?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Objects carrying a `status` field are kept only for acceptable statuses.
    fn is_acceptable(&self, payload: &Value) -> bool {
        match payload.get("status") {
            Some(Value::String(status)) => self.acceptable_statuses.iter().any(|s| s == status),
            Some(_) => false,
            None => true,
        }
    }

    /// Delete entries that are no longer fresh under `ttl`.
    pub async fn purge_expired(&self, ttl: Duration) -> Result<usize, CacheError> {
        let _guard = self.lock.lock().await;
        let removed = self
            .store
            .purge_older_than(cutoff_for(ttl, Utc::now()))
            .await?;
        if removed > 0 {
            tracing::info!("Purged {} expired upstream responses", removed);
        }
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            entry_count: self.store.len(),
        }
    }
}
