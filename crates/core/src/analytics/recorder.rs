//! Best-effort analytics recorder
//!
//! Every write is decoupled from the response path: failures are retried a
//! bounded number of times, then dropped with a loud log line. Nothing in
//! this module ever propagates an error to the caller.

use super::store::{click_record, DocumentStore};
use super::types::{BatchSummary, ClickEvent, SearchRecord, SessionClick};
use crate::config::AnalyticsSettings;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Recorder for search-event and click-event facts
#[derive(Clone)]
pub struct AnalyticsRecorder {
    store: Arc<dyn DocumentStore>,
    settings: AnalyticsSettings,
}

impl AnalyticsRecorder {
    /// Create a recorder over a document store
    pub fn new(store: Arc<dyn DocumentStore>, settings: AnalyticsSettings) -> Self {
        Self { store, settings }
    }

    /// Record a query event, best-effort
    ///
    /// The record is dropped after the configured number of attempts; the
    /// caller never observes a failure.
    pub async fn record_query(&self, record: SearchRecord) {
        let session_id = record.session_id.clone();
        let handler = record.handler.clone();
        let outcome = self
            .with_retries("query record", || {
                let record = record.clone();
                async move { self.store.insert(record).await }
            })
            .await;

        match outcome {
            Ok(()) => debug!("recorded query for {} via '{}'", session_id, handler),
            Err(e) => error!(
                "dropping query record for {} after {} attempts: {}",
                session_id, self.settings.write_attempts, e
            ),
        }
    }

    /// Attribute a click to the session's most relevant query record
    ///
    /// Creates a standalone click record when no query record matches, so no
    /// click is silently dropped. Best-effort like all analytics writes.
    pub async fn record_click(&self, session_id: &str, click: ClickEvent) {
        if let Err(e) = self.try_record_click(session_id, &click).await {
            error!(
                "dropping click for {} after {} attempts: {}",
                session_id, self.settings.write_attempts, e
            );
        }
    }

    /// Apply a batch of clicks, isolating failures per entry
    pub async fn record_clicks_batch(&self, clicks: Vec<SessionClick>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for entry in clicks {
            match self.try_record_click(&entry.session_id, &entry.click).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    warn!("batch click for {} failed: {}", entry.session_id, e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn try_record_click(&self, session_id: &str, click: &ClickEvent) -> Result<()> {
        self.with_retries("click record", || {
            let click = click.clone();
            async move {
                let record = click_record(click.url.clone(), click.title.clone(), click.position);
                let appended = self
                    .store
                    .append_click(session_id, click.original_query.as_deref(), record.clone())
                    .await?;
                if appended {
                    return Ok(());
                }

                // No open query record for this session; keep the click as a
                // standalone record.
                let mut standalone = SearchRecord::new(
                    session_id,
                    click.original_query.clone().unwrap_or_default(),
                    "click",
                );
                standalone.last_click_at = Some(record.clicked_at);
                standalone.clicks.push(record);
                self.store.insert(standalone).await
            }
        })
        .await
    }

    async fn with_retries<F, Fut>(&self, what: &str, mut op: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let attempts = self.settings.write_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match op().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("{} write attempt {}/{} failed: {}", what, attempt, attempts, e);
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(self.settings.retry_delay_ms))
                            .await;
                    }
                }
            }
        }
        Err(last_err.expect("at least one attempt"))
    }
}

impl std::fmt::Debug for AnalyticsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsRecorder")
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::store::{MemoryDocumentStore, UnavailableDocumentStore};
    use crate::analytics::types::ClickRecord;
    use crate::{GatewayError, Result as GwResult};
    use async_trait::async_trait;

    fn fast_settings() -> AnalyticsSettings {
        AnalyticsSettings {
            write_attempts: 3,
            retry_delay_ms: 1,
        }
    }

    fn click(url: &str, original_query: Option<&str>) -> ClickEvent {
        ClickEvent {
            url: url.to_string(),
            title: "Title".to_string(),
            position: 0,
            original_query: original_query.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_record_query() {
        let store = Arc::new(MemoryDocumentStore::new());
        let recorder = AnalyticsRecorder::new(store.clone(), fast_settings());

        recorder
            .record_query(SearchRecord::new("sess_1_a", "biology", "search"))
            .await;

        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_query_swallows_store_failure() {
        let recorder =
            AnalyticsRecorder::new(Arc::new(UnavailableDocumentStore), fast_settings());
        // Must not panic or error.
        recorder
            .record_query(SearchRecord::new("sess_1_a", "biology", "search"))
            .await;
    }

    #[tokio::test]
    async fn test_two_clicks_both_kept() {
        let store = Arc::new(MemoryDocumentStore::new());
        let recorder = AnalyticsRecorder::new(store.clone(), fast_settings());

        recorder
            .record_query(SearchRecord::new("sess_1_a", "biology", "search"))
            .await;
        recorder.record_click("sess_1_a", click("https://example.edu/1", None)).await;
        recorder.record_click("sess_1_a", click("https://example.edu/2", None)).await;

        let records = store.session_records("sess_1_a").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].clicks.len(), 2);
    }

    #[tokio::test]
    async fn test_orphan_click_creates_standalone_record() {
        let store = Arc::new(MemoryDocumentStore::new());
        let recorder = AnalyticsRecorder::new(store.clone(), fast_settings());

        recorder
            .record_click("sess_9_z", click("https://example.edu/x", Some("physics")))
            .await;

        let records = store.session_records("sess_9_z").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].handler, "click");
        assert_eq!(records[0].query, "physics");
        assert_eq!(records[0].clicks.len(), 1);
        assert!(records[0].last_click_at.is_some());
    }

    #[tokio::test]
    async fn test_batch_counts_successes() {
        let store = Arc::new(MemoryDocumentStore::new());
        let recorder = AnalyticsRecorder::new(store.clone(), fast_settings());

        recorder
            .record_query(SearchRecord::new("sess_1_a", "biology", "search"))
            .await;

        let summary = recorder
            .record_clicks_batch(vec![
                SessionClick {
                    session_id: "sess_1_a".to_string(),
                    click: click("https://example.edu/1", None),
                },
                SessionClick {
                    session_id: "sess_1_a".to_string(),
                    click: click("https://example.edu/2", None),
                },
            ])
            .await;

        assert_eq!(summary, BatchSummary { succeeded: 2, failed: 0 });
    }

    /// Store that rejects one poisoned session but accepts everything else
    struct FlakyStore {
        inner: MemoryDocumentStore,
        poisoned: String,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn insert(&self, record: SearchRecord) -> GwResult<()> {
            if record.session_id == self.poisoned {
                return Err(GatewayError::analytics("poisoned session"));
            }
            self.inner.insert(record).await
        }

        async fn append_click(
            &self,
            session_id: &str,
            original_query: Option<&str>,
            click: ClickRecord,
        ) -> GwResult<bool> {
            if session_id == self.poisoned {
                return Err(GatewayError::analytics("poisoned session"));
            }
            self.inner.append_click(session_id, original_query, click).await
        }
    }

    #[tokio::test]
    async fn test_batch_isolates_partial_failures() {
        let store = Arc::new(FlakyStore {
            inner: MemoryDocumentStore::new(),
            poisoned: "sess_2_b".to_string(),
        });
        let recorder = AnalyticsRecorder::new(store, fast_settings());

        let summary = recorder
            .record_clicks_batch(vec![
                SessionClick {
                    session_id: "sess_1_a".to_string(),
                    click: click("https://example.edu/1", None),
                },
                SessionClick {
                    session_id: "sess_2_b".to_string(),
                    click: click("https://example.edu/2", None),
                },
                SessionClick {
                    session_id: "sess_3_c".to_string(),
                    click: click("https://example.edu/3", None),
                },
            ])
            .await;

        assert_eq!(summary, BatchSummary { succeeded: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_batch_on_empty_input() {
        let recorder =
            AnalyticsRecorder::new(Arc::new(MemoryDocumentStore::new()), fast_settings());
        let summary = recorder.record_clicks_batch(Vec::new()).await;
        assert_eq!(summary, BatchSummary::default());
    }
}
