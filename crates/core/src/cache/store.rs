//! Versioned cache store with atomic rotation
//!
//! Two backing instances are live at any time; an atomic pointer selects
//! which one serves reads and writes. Rotation swaps the pointer process-wide
//! and in-flight operations against the previous instance complete in
//! isolation. All backing failures degrade to a miss or no-op.

use super::backend::CacheBackend;
use super::key::CacheKey;
use super::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifier of a physical backing cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheVersion {
    /// First configured cluster
    V1,
    /// Second configured cluster
    V2,
}

impl CacheVersion {
    fn index(self) -> usize {
        match self {
            CacheVersion::V1 => 0,
            CacheVersion::V2 => 1,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => CacheVersion::V1,
            _ => CacheVersion::V2,
        }
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        CacheVersion::V1
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheVersion::V1 => f.write_str("v1"),
            CacheVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for CacheVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v1" => Ok(CacheVersion::V1),
            "v2" => Ok(CacheVersion::V2),
            other => Err(format!("unknown cache version '{}'", other)),
        }
    }
}

/// Payload stored under a cache key
///
/// The body is the backend's response, uninterpreted; the result count rides
/// along so hits can report it without reparsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPayload {
    /// Serialized response payload
    pub body: serde_json::Value,
    /// Result count reported by the backend at store time
    pub result_count: usize,
}

impl CachedPayload {
    /// Create a payload
    pub fn new(body: serde_json::Value, result_count: usize) -> Self {
        Self { body, result_count }
    }
}

/// Versioned key-value store front
pub struct CacheStore {
    backings: [Arc<dyn CacheBackend>; 2],
    active: AtomicUsize,
    op_timeout: Duration,
}

impl CacheStore {
    /// Create a store over two backing instances
    pub fn new(
        v1: Arc<dyn CacheBackend>,
        v2: Arc<dyn CacheBackend>,
        active: CacheVersion,
        op_timeout: Duration,
    ) -> Self {
        Self {
            backings: [v1, v2],
            active: AtomicUsize::new(active.index()),
            op_timeout,
        }
    }

    /// Create a store over two fresh in-memory backings
    pub fn in_memory(op_timeout: Duration) -> Self {
        Self::new(
            Arc::new(super::backend::MemoryBackend::new()),
            Arc::new(super::backend::MemoryBackend::new()),
            CacheVersion::V1,
            op_timeout,
        )
    }

    /// Currently active version
    pub fn active_version(&self) -> CacheVersion {
        CacheVersion::from_index(self.active.load(Ordering::SeqCst))
    }

    /// Atomically redirect all subsequent operations to `target`
    ///
    /// Concurrent readers observe either the old or the new version, never a
    /// torn state. Operations already in flight finish against the instance
    /// they started with.
    pub fn rotate(&self, target: CacheVersion) {
        let previous = self.active.swap(target.index(), Ordering::SeqCst);
        debug!(
            "cache rotated from {} to {}",
            CacheVersion::from_index(previous),
            target
        );
    }

    /// Look up a cached payload
    ///
    /// Returns `None` for short queries, absent keys, expired entries, store
    /// errors, and store timeouts. The active version is dereferenced once
    /// at entry so a concurrent rotation cannot split this operation across
    /// instances.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
    ) -> Option<CachedPayload> {
        let key = match CacheKey::derive(endpoint, params) {
            Some(key) => key,
            None => {
                debug!("query below minimum length on '{}', bypassing cache", endpoint);
                return None;
            }
        };

        let backing = self.active_backing();
        let raw = match tokio::time::timeout(self.op_timeout, backing.get(key.as_str())).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                warn!(
                    "cache read failed on '{}' (key {}): {}, treating as miss",
                    endpoint,
                    key.truncated(),
                    e
                );
                return None;
            }
            Err(_) => {
                warn!(
                    "cache read timed out on '{}' (key {}), treating as miss",
                    endpoint,
                    key.truncated()
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(
                    "corrupt cache entry on '{}' (key {}): {}",
                    endpoint,
                    key.truncated(),
                    e
                );
                None
            }
        }
    }

    /// Store a payload under the derived key with the category's TTL
    ///
    /// A no-op for short queries and on any store failure. The write is
    /// observable by an immediately following `get` on the same version.
    pub async fn set(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
        payload: &CachedPayload,
        category: Category,
    ) {
        let key = match CacheKey::derive(endpoint, params) {
            Some(key) => key,
            None => return,
        };

        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize cache payload for '{}': {}", endpoint, e);
                return;
            }
        };

        let ttl = category.ttl_seconds();
        let backing = self.active_backing();
        match tokio::time::timeout(self.op_timeout, backing.set(key.as_str(), raw, ttl)).await {
            Ok(Ok(())) => {
                debug!(
                    "cached '{}' entry (key {}, category {}, ttl {}s)",
                    endpoint,
                    key.truncated(),
                    category,
                    ttl
                );
            }
            Ok(Err(e)) => {
                warn!(
                    "cache write failed on '{}' (key {}, category {}): {}",
                    endpoint,
                    key.truncated(),
                    category,
                    e
                );
            }
            Err(_) => {
                warn!(
                    "cache write timed out on '{}' (key {}, category {})",
                    endpoint,
                    key.truncated(),
                    category
                );
            }
        }
    }

    /// Dereference the rotation pointer
    ///
    /// Called once per operation; the result must not be cached across an
    /// await boundary outside the operation itself.
    fn active_backing(&self) -> Arc<dyn CacheBackend> {
        Arc::clone(&self.backings[self.active.load(Ordering::SeqCst)])
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("active", &self.active_version())
            .field("op_timeout", &self.op_timeout)
            .finish()
    }
}
