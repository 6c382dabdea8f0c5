//! Active IP-geolocation lookup
//!
//! Used only when edge geo headers are absent; the locator caches the result
//! in-process so each IP is looked up at most once per process lifetime.

use super::GeoResult;
use crate::config::GeoSettings;
use crate::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// External IP-geolocation collaborator
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Resolve an IP to location facts
    async fn lookup(&self, ip: &str) -> Result<GeoResult>;
}

/// Provider calling an ip-api style JSON endpoint
#[derive(Debug, Clone)]
pub struct HttpGeoProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    timezone: String,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    message: String,
}

impl HttpGeoProvider {
    /// Create a provider from settings
    pub fn new(settings: &GeoSettings) -> Result<Self> {
        // Validate the URL up front so misconfiguration fails at startup.
        url::Url::parse(&settings.provider_url)?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(settings.lookup_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.provider_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoResult> {
        let url = format!("{}/json/{}", self.base_url, ip);
        debug!("geo lookup for {}", ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::geo(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::geo(format!(
                "provider returned HTTP {}",
                response.status()
            )));
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::geo(format!("malformed provider response: {}", e)))?;

        if parsed.status != "success" {
            return Err(GatewayError::geo(format!(
                "provider rejected lookup: {}",
                parsed.message
            )));
        }

        Ok(GeoResult {
            city: parsed.city,
            region: parsed.region_name,
            country: parsed.country,
            timezone: parsed.timezone,
            latitude: parsed.lat,
            longitude: parsed.lon,
        })
    }
}
