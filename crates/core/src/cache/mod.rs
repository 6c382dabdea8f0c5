//! TTL-tiered cache keyed by normalized query identity
//!
//! The store abstracts a versioned key-value cluster: keys derive
//! deterministically from (endpoint, normalized parameters), TTL comes from a
//! fixed category table, and the active backing instance can be rotated
//! atomically without downtime. Every backing failure degrades to a miss or
//! no-op; the request path never sees a cache error.

pub mod backend;
pub mod key;
pub mod store;

pub use backend::{CacheBackend, MemoryBackend};
pub use key::{CacheKey, MIN_QUERY_LEN};
pub use store::{CacheStore, CacheVersion, CachedPayload};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a cached query, driving its TTL tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Autocomplete suggestions
    Suggestion,
    /// Academic program searches
    Program,
    /// People / staff directory searches
    People,
    /// Everything else
    Default,
}

impl Category {
    /// TTL applied to entries of this category, in seconds
    ///
    /// The table is fixed at write time; an entry keeps the TTL of the
    /// category it was stored under for its whole lifetime.
    pub fn ttl_seconds(&self) -> u64 {
        match self {
            Category::Suggestion => 3600,
            Category::Program => 86400,
            Category::People => 43200,
            Category::Default => 1800,
        }
    }

    /// Lowercase name used in keys and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Suggestion => "suggestion",
            Category::Program => "program",
            Category::People => "people",
            Category::Default => "default",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Default
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
