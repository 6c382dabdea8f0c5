//! Configuration types for the Searchgate core library

use crate::cache::CacheVersion;
use crate::logging::LoggingConfig;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Search backend settings
    pub backend: BackendConfig,
    /// Key-value cache settings
    pub cache: CacheSettings,
    /// Analytics recorder settings
    pub analytics: AnalyticsSettings,
    /// Geolocation settings
    pub geo: GeoSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from the environment, layered over defaults
    ///
    /// Variables use the `SEARCHGATE` prefix with `__` as the section
    /// separator, e.g. `SEARCHGATE__BACKEND__BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SEARCHGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Search backend collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the remote search service
    pub base_url: String,
    /// Default collection queried when the request does not name one
    pub collection: String,
    /// Default query profile
    pub profile: String,
    /// Default result-count limit
    pub num_ranks: u32,
    /// Response format requested from the backend
    pub form: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Status code returned to clients when the backend times out
    pub timeout_status: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9080/s/search.json".to_string(),
            collection: "web".to_string(),
            profile: "_default".to_string(),
            num_ranks: 10,
            form: "json".to_string(),
            timeout_ms: 5000,
            timeout_status: 500,
        }
    }
}

/// Key-value cache cluster settings
///
/// Two endpoints are configured so the backing cluster can be rotated
/// without downtime; `active_version` selects which one serves traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Endpoint of the v1 cluster
    pub v1_url: String,
    /// Endpoint of the v2 cluster
    pub v2_url: String,
    /// Version active at startup
    pub active_version: CacheVersion,
    /// Timeout applied to individual get/set operations, in milliseconds
    pub op_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            v1_url: "redis://localhost:6379".to_string(),
            v2_url: "redis://localhost:6380".to_string(),
            active_version: CacheVersion::V1,
            op_timeout_ms: 250,
        }
    }
}

/// Analytics recorder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Write attempts before a record is dropped
    pub write_attempts: u32,
    /// Delay between attempts, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            write_attempts: 3,
            retry_delay_ms: 50,
        }
    }
}

/// Geolocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Base URL of the IP-geolocation provider
    pub provider_url: String,
    /// Timeout for active lookups, in milliseconds
    pub lookup_timeout_ms: u64,
    /// Capacity of the in-process IP cache
    pub cache_capacity: u64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            provider_url: "http://ip-api.com".to_string(),
            lookup_timeout_ms: 1500,
            cache_capacity: 10_000,
        }
    }
}
