//! Deterministic cache key derivation
//!
//! Keys are a pure function of (endpoint, normalized query parameters):
//! identical queries yield identical keys regardless of parameter insertion
//! order. Queries below the minimum length never produce a key, so they are
//! never looked up or stored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Queries shorter than this are never cached
///
/// Short prefixes arrive once per keystroke and would pollute the cache with
/// low-quality entries.
pub const MIN_QUERY_LEN: usize = 3;

/// Parameter subset that participates in cache identity
///
/// Everything else (session ids, analytics flags, cache-busters) is ignored.
const IDENTITY_PARAMS: &[&str] = &[
    "query",
    "collection",
    "profile",
    "num_ranks",
    "form",
    "tab",
    "start_rank",
];

/// Characters of the key kept in log lines
const LOG_KEY_LEN: usize = 48;

/// Deterministic cache key scoped by endpoint name
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use searchgate_core::cache::CacheKey;
///
/// let mut a = HashMap::new();
/// a.insert("query".to_string(), "Computer Science".to_string());
/// a.insert("collection".to_string(), "programs".to_string());
///
/// let mut b = HashMap::new();
/// b.insert("collection".to_string(), "programs".to_string());
/// b.insert("query".to_string(), "computer science".to_string());
///
/// // Insertion order and query casing do not matter.
/// assert_eq!(
///     CacheKey::derive("search", &a),
///     CacheKey::derive("search", &b),
/// );
///
/// let mut short = HashMap::new();
/// short.insert("query".to_string(), "ab".to_string());
/// assert!(CacheKey::derive("search", &short).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Derive the key for an endpoint and parameter set
    ///
    /// Returns `None` when the query parameter is absent or shorter than
    /// [`MIN_QUERY_LEN`] characters; such requests bypass the cache entirely.
    pub fn derive(endpoint: &str, params: &HashMap<String, String>) -> Option<Self> {
        let query = params.get("query").map(|q| q.trim())?;
        if query.chars().count() < MIN_QUERY_LEN {
            return None;
        }

        // BTreeMap gives the stable ordering regardless of input order.
        let mut identity: BTreeMap<&str, String> = BTreeMap::new();
        for &name in IDENTITY_PARAMS {
            if let Some(value) = params.get(name) {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    continue;
                }
                // The backend treats query text case-insensitively.
                let normalized = if name == "query" {
                    trimmed.to_lowercase()
                } else {
                    trimmed.to_string()
                };
                identity.insert(name, normalized);
            }
        }

        let joined = identity
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        Some(Self {
            key: format!("{}:{}", endpoint, joined),
        })
    }

    /// Full key string handed to the backing store
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Truncated form for log lines, so full query text is not echoed at
    /// high volume
    pub fn truncated(&self) -> String {
        if self.key.chars().count() <= LOG_KEY_LEN {
            return self.key.clone();
        }
        let head: String = self.key.chars().take(LOG_KEY_LEN).collect();
        format!("{}..", head)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
