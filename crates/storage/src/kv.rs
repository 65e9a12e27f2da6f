//! Key-value store for persisted palette data
//!
//! This module provides a small, type-safe key-value store using sled.
//! Values are stored as JSON, so every entry is readable as the record
//! shape it was written with.

use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::sync::Arc;
use thiserror::Error;

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for flushing only on demand)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "theme_creator.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
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

/// Key-value store implementation
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore").finish_non_exhaustive()
    }
}

impl KvStore {
    /// Open a key-value store with configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        tracing::debug!("Opened key-value store at {}", config.path);
        Ok(Self { db: Arc::new(db) })
    }

    /// Create an in-memory key-value store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a value by key
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value by key
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Set several values in one atomic batch
    ///
    /// Values are serialized up front, so a serialization failure writes nothing.
    pub fn set_batch(&self, entries: &[(&str, serde_json::Value)]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for (key, value) in entries {
            batch.insert(key.as_bytes(), serde_json::to_vec(value)?);
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Remove a value by key
    pub fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.db.remove(key.as_bytes())?.is_some())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    /// Get the raw JSON stored under a key
    pub fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.get(key)
    }

    /// Clear all data
    pub fn clear(&self) -> Result<()> {
        self.db.clear()?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the number of keys in the store
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}
