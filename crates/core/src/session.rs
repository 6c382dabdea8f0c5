//! Session identifier registry
//!
//! Issues and validates the opaque session tokens that correlate a client's
//! sequence of searches and clicks. The registry is stateless: persistence
//! and propagation across requests are the caller's responsibility.

use chrono::Utc;
use uuid::Uuid;

/// Prefix carried by every session token
pub const SESSION_PREFIX: &str = "sess_";

const MIN_SESSION_LEN: usize = 10;
const MAX_SESSION_LEN: usize = 64;
const RANDOM_SUFFIX_LEN: usize = 8;

/// Stateless session identifier registry
///
/// # Examples
///
/// ```
/// use searchgate_core::session::SessionRegistry;
///
/// let registry = SessionRegistry::new();
/// let id = registry.ensure(None);
/// assert!(id.starts_with("sess_"));
///
/// let kept = registry.ensure(Some(&id));
/// assert_eq!(kept, id);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRegistry;

impl SessionRegistry {
    /// Create a new registry
    pub fn new() -> Self {
        Self
    }

    /// Return `existing` unchanged when syntactically valid, otherwise mint
    /// a fresh session identifier
    pub fn ensure(&self, existing: Option<&str>) -> String {
        match existing {
            Some(id) if Self::is_valid(id) => id.to_string(),
            _ => Self::mint(),
        }
    }

    /// Syntactic validation of a session token
    ///
    /// Tokens carry the `sess_` prefix, stay within length bounds, and use
    /// only ASCII alphanumerics and underscores.
    pub fn is_valid(id: &str) -> bool {
        id.starts_with(SESSION_PREFIX)
            && id.len() >= MIN_SESSION_LEN
            && id.len() <= MAX_SESSION_LEN
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Mint a fresh token combining a millisecond timestamp with a random
    /// suffix
    ///
    /// Uniqueness is best-effort: the suffix keeps concurrent requests in
    /// the same millisecond from colliding, without cryptographic claims.
    fn mint() -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_SUFFIX_LEN)
            .collect();
        format!("{}{}_{}", SESSION_PREFIX, millis, suffix)
    }
}
