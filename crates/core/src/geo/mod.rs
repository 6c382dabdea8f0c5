//! Best-effort IP geolocation
//!
//! Resolution prefers edge-provided geo headers (authoritative, zero extra
//! latency) and falls back to an active provider lookup cached in-process
//! for the lifetime of the process. Resolution never fails the caller: any
//! error yields a [`GeoResult`] with unknown fields.

pub mod locator;
pub mod provider;

pub use locator::{
    GeoLocator, HDR_CITY, HDR_COUNTRY, HDR_LATITUDE, HDR_LONGITUDE, HDR_REGION, HDR_TIMEZONE,
};
pub use provider::{GeoProvider, HttpGeoProvider};

use serde::{Deserialize, Serialize};

/// Resolved location facts for a client IP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    /// City name, empty when unknown
    pub city: String,
    /// Region or state, empty when unknown
    pub region: String,
    /// Country name, empty when unknown
    pub country: String,
    /// IANA timezone, empty when unknown
    pub timezone: String,
    /// Latitude, when known
    pub latitude: Option<f64>,
    /// Longitude, when known
    pub longitude: Option<f64>,
}

impl GeoResult {
    /// A result with every field unknown
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether no field carries a value
    pub fn is_unknown(&self) -> bool {
        self.city.is_empty()
            && self.region.is_empty()
            && self.country.is_empty()
            && self.timezone.is_empty()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}
