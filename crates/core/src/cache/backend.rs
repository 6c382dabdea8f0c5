//! Backing store abstraction for the key-value cache
//!
//! Production deployments point this at the external key-value cluster; the
//! in-memory implementation backs local development and tests.

use crate::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A single backing instance of the key-value cache cluster
///
/// Implementations store opaque string values under string keys with a
/// store-native TTL. Errors map to [`GatewayError::CacheUnavailable`]; the
/// store layer above degrades them to misses.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value; `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with the given TTL in seconds
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    stored_at: DateTime<Utc>,
    ttl_seconds: u64,
}

impl StoredEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        age.num_seconds() < self.ttl_seconds as i64
    }
}

/// In-memory cache backend with per-entry TTL
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.is_fresh(now)).count()
    }

    /// Shift an entry's stored-at timestamp into the past
    ///
    /// Lets tests walk an entry toward its TTL boundary without sleeping.
    /// Returns false when the key is absent.
    pub async fn backdate(&self, key: &str, seconds: i64) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.stored_at -= ChronoDuration::seconds(seconds);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(Utc::now()) => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry exists but expired; drop it under the write lock.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if !entry.is_fresh(Utc::now()) {
                entries.remove(key);
            }
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Err(GatewayError::cache("refusing zero TTL"));
        }
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                stored_at: Utc::now(),
                ttl_seconds,
            },
        );
        Ok(())
    }
}

/// Backend that fails every operation
///
/// Stands in for an unreachable cluster in degradation tests.
#[derive(Debug, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl CacheBackend for UnavailableBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(GatewayError::cache("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl_seconds: u64) -> Result<()> {
        Err(GatewayError::cache("connection refused"))
    }
}
