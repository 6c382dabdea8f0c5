//! Header-first geolocation with a process-lifetime IP cache

use super::provider::GeoProvider;
use super::GeoResult;
use crate::config::GeoSettings;
use moka::future::Cache;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Edge-provided city header
pub const HDR_CITY: &str = "x-geo-city";
/// Edge-provided region header
pub const HDR_REGION: &str = "x-geo-region";
/// Edge-provided country header
pub const HDR_COUNTRY: &str = "x-geo-country";
/// Edge-provided timezone header
pub const HDR_TIMEZONE: &str = "x-geo-timezone";
/// Edge-provided latitude header
pub const HDR_LATITUDE: &str = "x-geo-latitude";
/// Edge-provided longitude header
pub const HDR_LONGITUDE: &str = "x-geo-longitude";

/// Resolves client IPs to location facts
///
/// Never errors: any resolution failure yields [`GeoResult::unknown`].
pub struct GeoLocator {
    provider: Arc<dyn GeoProvider>,
    cache: Cache<String, GeoResult>,
    lookup_timeout: Duration,
}

impl GeoLocator {
    /// Create a locator over a provider
    pub fn new(provider: Arc<dyn GeoProvider>, settings: &GeoSettings) -> Self {
        Self {
            provider,
            cache: Cache::builder().max_capacity(settings.cache_capacity).build(),
            lookup_timeout: Duration::from_millis(settings.lookup_timeout_ms),
        }
    }

    /// Resolve a client IP, preferring edge-provided headers
    ///
    /// Headers are authoritative when present and cost no extra latency. An
    /// active lookup happens only when headers are absent, and its result is
    /// cached by IP for the remainder of the process lifetime.
    pub async fn resolve(
        &self,
        client_ip: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> GeoResult {
        if let Some(geo) = Self::from_headers(headers) {
            return geo;
        }

        let ip = match client_ip.map(str::trim) {
            Some(ip) if !ip.is_empty() => ip.to_string(),
            _ => return GeoResult::unknown(),
        };

        if let Some(cached) = self.cache.get(&ip).await {
            return cached;
        }

        match tokio::time::timeout(self.lookup_timeout, self.provider.lookup(&ip)).await {
            Ok(Ok(geo)) => {
                debug!("geo resolved {} to {}/{}", ip, geo.city, geo.country);
                self.cache.insert(ip, geo.clone()).await;
                geo
            }
            Ok(Err(e)) => {
                warn!("geo lookup for {} failed: {}", ip, e);
                GeoResult::unknown()
            }
            Err(_) => {
                warn!("geo lookup for {} timed out", ip);
                GeoResult::unknown()
            }
        }
    }

    /// Build a result from edge headers, when any location header is present
    fn from_headers(headers: &HashMap<String, String>) -> Option<GeoResult> {
        let city = header_value(headers, HDR_CITY);
        let region = header_value(headers, HDR_REGION);
        let country = header_value(headers, HDR_COUNTRY);
        let timezone = header_value(headers, HDR_TIMEZONE);

        if city.is_empty() && country.is_empty() {
            return None;
        }

        Some(GeoResult {
            city,
            region,
            country,
            timezone,
            latitude: header_value(headers, HDR_LATITUDE).parse().ok(),
            longitude: header_value(headers, HDR_LONGITUDE).parse().ok(),
        })
    }
}

/// Fetch and percent-decode a header value
///
/// City names may arrive URL-encoded from the header source.
fn header_value(headers: &HashMap<String, String>, name: &str) -> String {
    let raw = match headers.get(name) {
        Some(raw) => raw.trim(),
        None => return String::new(),
    };
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

impl std::fmt::Debug for GeoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoLocator")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}
