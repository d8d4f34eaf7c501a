use crate::cache::{EntryStore, StoreKey, StoredEntry};
use crate::error::CacheError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

const ENTRY_EXTENSION: &str = "entry.json";

/// Persistent store keeping one JSON document per key under a directory.
/// Files are named by the SHA-256 of the key; the key itself lives inside.
///
/// Writes go to a temporary file in the same directory and are renamed over
/// the target, so a reader never observes a half-written entry. The in-memory
/// index is rebuilt from the directory when the store is opened.
pub struct DiskStore {
    cache_dir: PathBuf,
    index: Arc<RwLock<DiskIndex>>,
    entry_count: Arc<AtomicUsize>,
}

#[derive(Default)]
struct DiskIndex {
    by_key: HashMap<StoreKey, EntryMetadata>,
    by_age: BTreeSet<(DateTime<Utc>, StoreKey)>,
}

#[derive(Clone)]
struct EntryMetadata {
    file_path: PathBuf,
    created_at: DateTime<Utc>,
}

impl DiskIndex {
    fn insert(&mut self, key: StoreKey, metadata: EntryMetadata) -> Option<EntryMetadata> {
        let previous = self.remove(&key);
        self.by_age.insert((metadata.created_at, key.clone()));
        self.by_key.insert(key, metadata);
        previous
    }

    fn remove(&mut self, key: &str) -> Option<EntryMetadata> {
        let metadata = self.by_key.remove(key)?;
        self.by_age.remove(&(metadata.created_at, key.to_string()));
        Some(metadata)
    }

    fn len(&self) -> usize {
        self.by_key.len()
    }
}

impl DiskStore {
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;

        let index = Self::initialize_from_disk(&cache_dir)?;
        let entry_count = index.len();
        tracing::debug!(
            "Opened disk store at {:?} with {} entries",
            cache_dir,
            entry_count
        );

        Ok(Self {
            cache_dir,
            index: Arc::new(RwLock::new(index)),
            entry_count: Arc::new(AtomicUsize::new(entry_count)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.cache_dir
    }

    fn initialize_from_disk(cache_dir: &Path) -> Result<DiskIndex, CacheError> {
        let mut index = DiskIndex::default();

        for dir_entry in fs::read_dir(cache_dir)? {
            let path = dir_entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(ENTRY_EXTENSION));
            if !is_entry {
                continue;
            }

            match Self::read_entry(&path) {
                Ok(entry) => {
                    index.insert(
                        entry.key,
                        EntryMetadata {
                            file_path: path,
                            created_at: entry.created_at,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable cache file {:?}: {}", path, e);
                }
            }
        }

        Ok(index)
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("empty key".to_string()));
        }
        // Hex digest keeps file names distinct for every distinct key
        let digest = Sha256::digest(key.as_bytes());
        Ok(self.cache_dir.join(format!("{:x}.{}", digest, ENTRY_EXTENSION)))
    }

    fn read_entry(path: &Path) -> Result<StoredEntry, CacheError> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn write_entry(&self, path: &Path, entry: &StoredEntry) -> Result<(), CacheError> {
        let encoded = serde_json::to_vec(entry)?;
        let mut file = NamedTempFile::new_in(&self.cache_dir)?;
        file.write_all(&encoded)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn remove_file(metadata: &EntryMetadata) {
        if let Err(e) = fs::remove_file(&metadata.file_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove cache file {:?}: {}",
                    metadata.file_path,
                    e
                );
            }
        }
    }
}

#[async_trait::async_trait]
impl EntryStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let index = self.index.read().await;

        let Some(metadata) = index.by_key.get(key) else {
            return Ok(None);
        };

        match Self::read_entry(&metadata.file_path) {
            Ok(entry) if entry.key == key => Ok(Some(entry)),
            Ok(entry) => {
                tracing::warn!(
                    "Cache file {:?} holds key {} instead of {}",
                    metadata.file_path,
                    entry.key,
                    key
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Failed to read cache file {:?}: {}", metadata.file_path, e);
                Ok(None)
            }
        }
    }

    async fn upsert(&self, entry: StoredEntry) -> Result<(), CacheError> {
        let file_path = self.key_to_path(&entry.key)?;

        let mut index = self.index.write().await;
        self.write_entry(&file_path, &entry)?;

        let metadata = EntryMetadata {
            file_path,
            created_at: entry.created_at,
        };
        index.insert(entry.key, metadata);
        self.entry_count.store(index.len(), Ordering::Relaxed);

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut index = self.index.write().await;

        if let Some(metadata) = index.remove(key) {
            Self::remove_file(&metadata);
        }
        self.entry_count.store(index.len(), Ordering::Relaxed);

        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut index = self.index.write().await;

        let expired: Vec<StoreKey> = index
            .by_age
            .iter()
            .take_while(|(created_at, _)| *created_at <= cutoff)
            .map(|(_, key)| key.clone())
            .collect();

        for key in &expired {
            if let Some(metadata) = index.remove(key) {
                Self::remove_file(&metadata);
            }
        }
        self.entry_count.store(index.len(), Ordering::Relaxed);

        Ok(expired.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut index = self.index.write().await;

        for (_, metadata) in index.by_key.drain() {
            Self::remove_file(&metadata);
        }
        index.by_age.clear();
        self.entry_count.store(0, Ordering::Relaxed);

        Ok(())
    }

    fn len(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }
}
