//! Search backend collaborator
//!
//! The remote search service is consumed over HTTP GET/JSON. Its nested
//! result-packet structure is not interpreted here beyond probing the result
//! count; reshaping belongs to the handler layer.

use crate::config::BackendConfig;
use crate::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

/// Response from the search backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    /// Response payload, uninterpreted
    pub body: Value,
    /// Result count probed from the payload's summary fields
    pub result_count: usize,
}

/// The remote search service
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a search with the given query parameters
    async fn search(&self, params: &HashMap<String, String>) -> Result<BackendResponse>;
}

/// HTTP implementation of [`SearchBackend`]
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpSearchBackend {
    /// Create a backend client from settings
    pub fn new(config: BackendConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    /// Merge configured defaults into the request parameters
    fn effective_params(&self, params: &HashMap<String, String>) -> Vec<(String, String)> {
        let mut merged = params.clone();
        merged
            .entry("collection".to_string())
            .or_insert_with(|| self.config.collection.clone());
        merged
            .entry("profile".to_string())
            .or_insert_with(|| self.config.profile.clone());
        merged
            .entry("num_ranks".to_string())
            .or_insert_with(|| self.config.num_ranks.to_string());
        merged
            .entry("form".to_string())
            .or_insert_with(|| self.config.form.clone());

        let mut pairs: Vec<(String, String)> = merged.into_iter().collect();
        pairs.sort();
        pairs
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, params: &HashMap<String, String>) -> Result<BackendResponse> {
        let pairs = self.effective_params(params);
        debug!("backend search against {}", self.config.base_url);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::backend_timeout(self.config.timeout_ms)
                } else {
                    GatewayError::backend(500, format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(
                "backend returned HTTP {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            );
            return Err(GatewayError::backend(
                status.as_u16(),
                format!("backend returned HTTP {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::backend(500, format!("malformed backend JSON: {}", e)))?;

        let result_count = extract_result_count(&body);
        Ok(BackendResponse { body, result_count })
    }
}

/// Probe the backend payload for a result count
///
/// Checks the result-packet summary at its known nesting depths, then falls
/// back to treating a bare array (suggestion responses) as the results.
pub fn extract_result_count(body: &Value) -> usize {
    let summary_paths: [&[&str]; 3] = [
        &["response", "resultPacket", "resultsSummary", "totalMatching"],
        &["resultPacket", "resultsSummary", "totalMatching"],
        &["totalMatching"],
    ];

    for path in summary_paths {
        let mut node = body;
        let mut found = true;
        for segment in path {
            match node.get(segment) {
                Some(next) => node = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            if let Some(count) = node.as_u64() {
                return count as usize;
            }
        }
    }

    if let Some(items) = body.as_array() {
        return items.len();
    }
    if let Some(items) = body.get("suggestions").and_then(Value::as_array) {
        return items.len();
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_rejects_bad_url() {
        let config = BackendConfig {
            base_url: "not a url".to_string(),
            ..BackendConfig::default()
        };
        assert!(HttpSearchBackend::new(config).is_err());
    }

    #[test]
    fn test_effective_params_applies_defaults() {
        let backend = HttpSearchBackend::new(BackendConfig::default()).unwrap();
        let mut params = HashMap::new();
        params.insert("query".to_string(), "biology".to_string());

        let pairs = backend.effective_params(&params);
        let map: HashMap<_, _> = pairs.into_iter().collect();
        assert_eq!(map.get("collection"), Some(&"web".to_string()));
        assert_eq!(map.get("profile"), Some(&"_default".to_string()));
        assert_eq!(map.get("num_ranks"), Some(&"10".to_string()));
        assert_eq!(map.get("query"), Some(&"biology".to_string()));
    }

    #[test]
    fn test_effective_params_respects_overrides() {
        let backend = HttpSearchBackend::new(BackendConfig::default()).unwrap();
        let mut params = HashMap::new();
        params.insert("query".to_string(), "biology".to_string());
        params.insert("collection".to_string(), "staff".to_string());

        let pairs = backend.effective_params(&params);
        let map: HashMap<_, _> = pairs.into_iter().collect();
        assert_eq!(map.get("collection"), Some(&"staff".to_string()));
    }

    #[test]
    fn test_result_count_from_nested_summary() {
        let body = json!({
            "response": {
                "resultPacket": {
                    "resultsSummary": {"totalMatching": 42},
                    "results": []
                }
            }
        });
        assert_eq!(extract_result_count(&body), 42);
    }

    #[test]
    fn test_result_count_from_shallow_summary() {
        let body = json!({"resultPacket": {"resultsSummary": {"totalMatching": 7}}});
        assert_eq!(extract_result_count(&body), 7);
    }

    #[test]
    fn test_result_count_from_array_body() {
        let body = json!(["one", "two", "three"]);
        assert_eq!(extract_result_count(&body), 3);
    }

    #[test]
    fn test_result_count_from_suggestions_field() {
        let body = json!({"suggestions": ["a", "b"]});
        assert_eq!(extract_result_count(&body), 2);
    }

    #[test]
    fn test_result_count_defaults_to_zero() {
        assert_eq!(extract_result_count(&json!({"unexpected": true})), 0);
        assert_eq!(extract_result_count(&json!(null)), 0);
    }
}
