//! Key-value cache store
//!
//! This module defines the [`CacheStore`] contract used by every synchronizer
//! and a durable implementation backed by sled. The store is string-only:
//! callers serialize their payloads before writing and parse them after
//! reading. Missing keys are never an error.

use async_trait::async_trait;
use sled::Db;
use std::sync::Arc;
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Stored bytes are not valid UTF-8
    #[error("Invalid encoding for key {0}")]
    Encoding(String),

    /// Store is unavailable (closed, locked or otherwise unusable)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable string key-value store shared across synchronizers
///
/// All operations may suspend on I/O. A missing key yields `None`, never an
/// error; errors are reserved for genuine storage failures.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is a no-op
    async fn remove(&self, key: &str) -> Result<()>;

    /// Get every entry in the store
    async fn get_all(&self) -> Result<Vec<(String, String)>>;

    /// Get several keys at once, preserving the requested order
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key).await?;
            results.push(((*key).to_string(), value));
        }
        Ok(results)
    }
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Background flush interval in milliseconds (None flushes only on demand)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "newsdesk_cache.db".to_string(),
            cache_capacity: 16 * 1024 * 1024, // 16MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Sled-backed cache store that survives process restarts
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
}

impl SledStore {
    /// Open (or create) a store with configuration
    pub fn open(config: KvConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);

        if let Some(ms) = config.flush_every_ms {
            db_config = db_config.flush_every_ms(Some(ms));
        }

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, "opened cache store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary store that is deleted on drop (for testing)
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<(String, String)> {
        let key = String::from_utf8(key.to_vec())
            .map_err(|_| StorageError::Encoding(String::from_utf8_lossy(key).into_owned()))?;
        let value =
            String::from_utf8(value.to_vec()).map_err(|_| StorageError::Encoding(key.clone()))?;
        Ok((key, value))
    }
}

#[async_trait]
impl CacheStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|_| StorageError::Encoding(key.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            match Self::decode(&key, &value) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("skipping undecodable cache entry: {}", e),
            }
        }
        Ok(entries)
    }
}
