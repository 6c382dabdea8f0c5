//! Analytics record types
//!
//! One document per query event, clicks nested as a growable list within it.
//! Field names follow the persisted document schema (camelCase).

use crate::geo::GeoResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of a single search query event
///
/// Identity is (session id, query, handler, creation timestamp); multiple
/// records may exist per session. Client facts are anonymized: user agent
/// and referer are kept, raw IPs never are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    /// Session correlating this query with the client's other activity
    pub session_id: String,
    /// Raw query string
    pub query: String,
    /// Handler (endpoint) that served the query
    pub handler: String,
    /// Backend collection used
    pub collection: String,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Client referer
    pub referer: Option<String>,
    /// Resolved city
    pub city: String,
    /// Resolved region
    pub region: String,
    /// Resolved country
    pub country: String,
    /// Resolved timezone
    pub timezone: String,
    /// Time to decide the response, in milliseconds
    pub response_time_ms: u64,
    /// Number of results returned
    pub result_count: usize,
    /// Whether any results were returned
    pub has_results: bool,
    /// Whether the response came from cache
    pub cache_hit: bool,
    /// Whether the program tab was active
    pub is_program_tab: bool,
    /// Whether the staff tab was active
    pub is_staff_tab: bool,
    /// All tabs active on the request
    pub tabs: Vec<String>,
    /// Free-form content-type-specific metadata, no rigid schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<serde_json::Value>,
    /// Clicks attributed to this query, appended out of band
    pub clicks: Vec<ClickRecord>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent attributed click
    pub last_click_at: Option<DateTime<Utc>>,
}

impl SearchRecord {
    /// Create a record with empty facts, stamped now
    pub fn new<S1, S2, S3>(session_id: S1, query: S2, handler: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            handler: handler.into(),
            collection: String::new(),
            user_agent: None,
            referer: None,
            city: String::new(),
            region: String::new(),
            country: String::new(),
            timezone: String::new(),
            response_time_ms: 0,
            result_count: 0,
            has_results: false,
            cache_hit: false,
            is_program_tab: false,
            is_staff_tab: false,
            tabs: Vec::new(),
            enrichment: None,
            clicks: Vec::new(),
            created_at: Utc::now(),
            last_click_at: None,
        }
    }

    /// Copy resolved location facts into the record
    pub fn set_location(&mut self, geo: &GeoResult) {
        self.city = geo.city.clone();
        self.region = geo.region.clone();
        self.country = geo.country.clone();
        self.timezone = geo.timezone.clone();
    }
}

/// A click attributed to a query record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    /// Clicked result URL
    pub url: String,
    /// Clicked result title
    pub title: String,
    /// Position of the result in the result list (0-based)
    pub position: usize,
    /// Click timestamp
    pub clicked_at: DateTime<Utc>,
}

/// Inbound click event, before attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    /// Clicked result URL
    pub url: String,
    /// Clicked result title
    pub title: String,
    /// Position of the result in the result list (0-based)
    pub position: usize,
    /// Query the user originally searched, used to narrow attribution
    pub original_query: Option<String>,
}

/// A click event carrying its own session, for batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClick {
    /// Session the click belongs to
    pub session_id: String,
    /// The click itself
    #[serde(flatten)]
    pub click: ClickEvent,
}

/// Outcome of a batch click submission
///
/// Partial failures are isolated per entry; the summary never represents an
/// all-or-nothing result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Entries recorded
    pub succeeded: usize,
    /// Entries dropped after retries
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = SearchRecord::new("sess_1_a", "biology", "search");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""sessionId""#));
        assert!(json.contains(r#""cacheHit""#));
        assert!(json.contains(r#""resultCount""#));
        assert!(json.contains(r#""isProgramTab""#));
        assert!(!json.contains(r#""session_id""#));
    }

    #[test]
    fn test_record_roundtrip() {
        let mut record = SearchRecord::new("sess_1_a", "biology", "search");
        record.result_count = 12;
        record.has_results = true;
        record.enrichment = Some(json!({"facets": {"level": "undergraduate"}}));
        record.clicks.push(ClickRecord {
            url: "https://example.edu/bio".to_string(),
            title: "Biology".to_string(),
            position: 0,
            clicked_at: Utc::now(),
        });

        let json = serde_json::to_string(&record).unwrap();
        let parsed: SearchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_enrichment_omitted_when_absent() {
        let record = SearchRecord::new("sess_1_a", "biology", "search");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("enrichment"));
    }

    #[test]
    fn test_set_location() {
        let geo = GeoResult {
            city: "Lincoln".to_string(),
            region: "Nebraska".to_string(),
            country: "United States".to_string(),
            timezone: "America/Chicago".to_string(),
            latitude: Some(40.8),
            longitude: Some(-96.7),
        };
        let mut record = SearchRecord::new("sess_1_a", "biology", "search");
        record.set_location(&geo);
        assert_eq!(record.city, "Lincoln");
        assert_eq!(record.timezone, "America/Chicago");
    }

    #[test]
    fn test_session_click_flattens() {
        let click = SessionClick {
            session_id: "sess_1_a".to_string(),
            click: ClickEvent {
                url: "https://example.edu".to_string(),
                title: "Example".to_string(),
                position: 2,
                original_query: Some("biology".to_string()),
            },
        };
        let json = serde_json::to_string(&click).unwrap();
        assert!(json.contains(r#""sessionId""#));
        assert!(json.contains(r#""url""#));
        let parsed: SessionClick = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, click);
    }
}
