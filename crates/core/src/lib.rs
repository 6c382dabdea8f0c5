//! Searchgate core library
//!
//! The shared caching and analytics substrate behind the Searchgate search
//! handlers: a TTL-tiered cache keyed by normalized query identity with
//! atomic cluster rotation, a best-effort analytics recorder with session
//! correlation and click attribution, non-blocking location enrichment, and
//! the per-request orchestration tying them together.
//!
//! The thin per-endpoint handlers, the remote search service, and the
//! physical cache/document clusters are collaborators; this crate holds the
//! interfaces and the logic between them.

pub mod analytics;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod proxy;
pub mod session;

pub use analytics::{AnalyticsRecorder, BatchSummary, ClickEvent, SearchRecord, SessionClick};
pub use backend::{HttpSearchBackend, SearchBackend};
pub use cache::{CacheStore, CacheVersion, CachedPayload, Category};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use geo::{GeoLocator, GeoResult};
pub use proxy::{FailureCause, ProxyCore, SearchOutcome, SearchRequest};
pub use session::SessionRegistry;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_is_usable() {
        let config = GatewayConfig::default();
        assert!(config.backend.timeout_ms > 0);
    }
}
