//! Error handling for the Searchgate core library

use thiserror::Error;

/// Result type alias for Searchgate operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for Searchgate operations
///
/// Only `BackendFailure` and `BackendTimeout` are ever surfaced to the
/// request path; every other variant is absorbed inside the core and only
/// visible through logs.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Key-value cache connection or timeout errors; degrade to miss/no-op
    #[error("cache unavailable: {message}")]
    CacheUnavailable { message: String },

    /// Non-2xx or network error from the search backend; fatal to the request
    #[error("search backend failure (status {status}): {message}")]
    BackendFailure { status: u16, message: String },

    /// Search backend call exceeded the configured timeout
    #[error("search backend timed out after {elapsed_ms}ms")]
    BackendTimeout { elapsed_ms: u64 },

    /// Analytics write failures; always swallowed and logged
    #[error("analytics write failure: {message}")]
    AnalyticsWriteFailure { message: String },

    /// Geolocation resolution failures; swallowed, empty location returned
    #[error("geo resolution failure: {message}")]
    GeoResolutionFailure { message: String },

    /// Invalid configuration values
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl GatewayError {
    /// Create a cache unavailability error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::CacheUnavailable {
            message: message.into(),
        }
    }

    /// Create a backend failure with the upstream status code
    pub fn backend<S: Into<String>>(status: u16, message: S) -> Self {
        Self::BackendFailure {
            status,
            message: message.into(),
        }
    }

    /// Create a backend timeout error
    pub fn backend_timeout(elapsed_ms: u64) -> Self {
        Self::BackendTimeout { elapsed_ms }
    }

    /// Create an analytics write failure
    pub fn analytics<S: Into<String>>(message: S) -> Self {
        Self::AnalyticsWriteFailure {
            message: message.into(),
        }
    }

    /// Create a geo resolution failure
    pub fn geo<S: Into<String>>(message: S) -> Self {
        Self::GeoResolutionFailure {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is fatal to the user-facing request
    ///
    /// Everything except backend failures degrades inside the core.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BackendFailure { .. } | Self::BackendTimeout { .. }
        )
    }

    /// HTTP status to return to the client for this error
    pub fn response_status(&self) -> u16 {
        match self {
            Self::BackendFailure { status, .. } if *status >= 400 => *status,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_is_not_fatal() {
        let err = GatewayError::cache("connection refused");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_backend_errors_are_fatal() {
        assert!(GatewayError::backend(502, "bad gateway").is_fatal());
        assert!(GatewayError::backend_timeout(5000).is_fatal());
    }

    #[test]
    fn test_analytics_and_geo_are_swallowed() {
        assert!(!GatewayError::analytics("insert failed").is_fatal());
        assert!(!GatewayError::geo("provider down").is_fatal());
    }

    #[test]
    fn test_response_status_prefers_upstream() {
        assert_eq!(GatewayError::backend(503, "unavailable").response_status(), 503);
        assert_eq!(GatewayError::backend(0, "connect error").response_status(), 500);
        assert_eq!(GatewayError::backend_timeout(2000).response_status(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::backend(502, "upstream said no");
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("upstream said no"));
    }
}
