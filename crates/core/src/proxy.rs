//! Request orchestration
//!
//! For one inbound request: cache lookup, backend call on miss, cache store
//! on success, then a detached analytics record regardless of outcome. The
//! caller receives the same logical result whether the payload came from
//! cache or backend, and the acknowledgment never waits on analytics or
//! geolocation.

use crate::analytics::{AnalyticsRecorder, SearchRecord};
use crate::backend::SearchBackend;
use crate::cache::{CacheStore, CachedPayload, Category};
use crate::config::BackendConfig;
use crate::geo::GeoLocator;
use crate::session::SessionRegistry;
use crate::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Why a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Backend returned an error or was unreachable
    UpstreamFailure,
    /// Backend exceeded the configured timeout
    UpstreamTimeout,
}

/// One inbound search request
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Endpoint identifier, scopes cache keys and names the handler in
    /// analytics
    pub handler: String,
    /// Raw query string
    pub query: String,
    /// Query parameters forwarded to the backend
    pub params: HashMap<String, String>,
    /// TTL tier for cached results
    pub category: Category,
    /// Session identifier supplied by the client, if any
    pub session_id: Option<String>,
    /// Client IP, used only for geo enrichment, never persisted
    pub client_ip: Option<String>,
    /// Inbound headers (lowercase names), consulted for edge geo metadata
    pub headers: HashMap<String, String>,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Client referer
    pub referer: Option<String>,
    /// Tabs active on the client surface
    pub tabs: Vec<String>,
    /// Free-form enrichment attached to the analytics record
    pub enrichment: Option<serde_json::Value>,
}

impl SearchRequest {
    /// Create a request with the required fields
    pub fn new<S1, S2>(handler: S1, query: S2, category: Category) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            handler: handler.into(),
            query: query.into(),
            category,
            ..Self::default()
        }
    }
}

/// Decided response for a request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// HTTP status to return
    pub status: u16,
    /// Response payload; generic error body on failure
    pub body: serde_json::Value,
    /// Whether the payload came from cache
    pub cache_hit: bool,
    /// Session identifier, minted when the client supplied none
    pub session_id: String,
    /// Time to decide the response, in milliseconds
    pub response_time_ms: u64,
    /// Failure cause, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureCause>,
}

/// Orchestrates cache, backend, analytics, and enrichment for each request
pub struct ProxyCore {
    cache: Arc<CacheStore>,
    recorder: Arc<AnalyticsRecorder>,
    locator: Arc<GeoLocator>,
    backend: Arc<dyn SearchBackend>,
    sessions: SessionRegistry,
    backend_timeout: Duration,
    timeout_status: u16,
}

impl ProxyCore {
    /// Create the orchestrator
    pub fn new(
        cache: Arc<CacheStore>,
        recorder: Arc<AnalyticsRecorder>,
        locator: Arc<GeoLocator>,
        backend: Arc<dyn SearchBackend>,
        config: &BackendConfig,
    ) -> Self {
        Self {
            cache,
            recorder,
            locator,
            backend,
            sessions: SessionRegistry::new(),
            backend_timeout: Duration::from_millis(config.timeout_ms),
            timeout_status: config.timeout_status,
        }
    }

    /// Handle one request end to end
    ///
    /// Never returns an error: failures are folded into the outcome with a
    /// generic body, and their detail goes to the logs.
    pub async fn handle(&self, request: SearchRequest) -> SearchOutcome {
        let started = Instant::now();
        let session_id = self.sessions.ensure(request.session_id.as_deref());

        let mut params = request.params.clone();
        params
            .entry("query".to_string())
            .or_insert_with(|| request.query.clone());

        if let Some(hit) = self.cache.get(&request.handler, &params).await {
            let outcome = SearchOutcome {
                status: 200,
                body: hit.body,
                cache_hit: true,
                session_id: session_id.clone(),
                response_time_ms: elapsed_ms(started),
                failure: None,
            };
            info!(
                "'{}' served from cache in {}ms (session {})",
                request.handler, outcome.response_time_ms, session_id
            );
            self.record(&request, &params, &session_id, &outcome, hit.result_count);
            return outcome;
        }

        let outcome = match tokio::time::timeout(
            self.backend_timeout,
            self.backend.search(&params),
        )
        .await
        {
            Ok(Ok(response)) => {
                let payload = CachedPayload::new(response.body.clone(), response.result_count);
                self.cache
                    .set(&request.handler, &params, &payload, request.category)
                    .await;
                SearchOutcome {
                    status: 200,
                    body: response.body,
                    cache_hit: false,
                    session_id: session_id.clone(),
                    response_time_ms: elapsed_ms(started),
                    failure: None,
                }
            }
            Ok(Err(GatewayError::BackendTimeout { elapsed_ms })) => {
                warn!(
                    "'{}' backend timed out after {}ms",
                    request.handler, elapsed_ms
                );
                self.failure_outcome(&session_id, self.timeout_status, FailureCause::UpstreamTimeout, started)
            }
            Ok(Err(e)) => {
                error!("'{}' backend call failed: {}", request.handler, e);
                self.failure_outcome(
                    &session_id,
                    e.response_status(),
                    FailureCause::UpstreamFailure,
                    started,
                )
            }
            Err(_) => {
                warn!(
                    "'{}' backend exceeded the {}ms limit",
                    request.handler,
                    self.backend_timeout.as_millis()
                );
                self.failure_outcome(&session_id, self.timeout_status, FailureCause::UpstreamTimeout, started)
            }
        };

        let result_count = if outcome.failure.is_none() {
            extract_count(&outcome.body)
        } else {
            0
        };
        self.record(&request, &params, &session_id, &outcome, result_count);
        outcome
    }

    fn failure_outcome(
        &self,
        session_id: &str,
        status: u16,
        cause: FailureCause,
        started: Instant,
    ) -> SearchOutcome {
        SearchOutcome {
            status,
            body: json!({"error": "search backend unavailable"}),
            cache_hit: false,
            session_id: session_id.to_string(),
            response_time_ms: elapsed_ms(started),
            failure: Some(cause),
        }
    }

    /// Detach the analytics record from the response path
    ///
    /// Geo resolution runs inside the detached task so enrichment never
    /// delays the decided response.
    fn record(
        &self,
        request: &SearchRequest,
        params: &HashMap<String, String>,
        session_id: &str,
        outcome: &SearchOutcome,
        result_count: usize,
    ) {
        let mut record = SearchRecord::new(session_id, &request.query, &request.handler);
        record.collection = params.get("collection").cloned().unwrap_or_default();
        record.user_agent = request.user_agent.clone();
        record.referer = request.referer.clone();
        record.response_time_ms = outcome.response_time_ms;
        record.result_count = result_count;
        record.has_results = result_count > 0;
        record.cache_hit = outcome.cache_hit;
        record.tabs = request.tabs.clone();
        let (is_program, is_staff) = tab_flags(&request.tabs);
        record.is_program_tab = is_program;
        record.is_staff_tab = is_staff;
        record.enrichment = request.enrichment.clone();

        let locator = Arc::clone(&self.locator);
        let recorder = Arc::clone(&self.recorder);
        let client_ip = request.client_ip.clone();
        let headers = request.headers.clone();
        tokio::spawn(async move {
            let geo = locator.resolve(client_ip.as_deref(), &headers).await;
            record.set_location(&geo);
            recorder.record_query(record).await;
        });
    }
}

impl std::fmt::Debug for ProxyCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCore")
            .field("backend_timeout", &self.backend_timeout)
            .field("timeout_status", &self.timeout_status)
            .finish()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn tab_flags(tabs: &[String]) -> (bool, bool) {
    let mut is_program = false;
    let mut is_staff = false;
    for tab in tabs {
        let tab = tab.trim().to_lowercase();
        match tab.as_str() {
            "program" | "programs" => is_program = true,
            "staff" | "people" => is_staff = true,
            _ => {}
        }
    }
    (is_program, is_staff)
}

fn extract_count(body: &serde_json::Value) -> usize {
    crate::backend::extract_result_count(body)
}
