//! Document store abstraction for analytics records
//!
//! Production deployments point this at the external document store; the
//! in-memory implementation backs local development and tests.

use super::types::{ClickRecord, SearchRecord};
use crate::{GatewayError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

/// Append/update store for analytics documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a query record
    async fn insert(&self, record: SearchRecord) -> Result<()>;

    /// Append a click to the most relevant open record for a session
    ///
    /// Attribution tie-break: the most recent record whose query matches
    /// `original_query` when one is given, otherwise the most recent record
    /// for the session. Returns false when no record matches; the caller
    /// decides what to do with the orphan click. Must retain concurrent
    /// clicks for the same session without overwriting.
    async fn append_click(
        &self,
        session_id: &str,
        original_query: Option<&str>,
        click: ClickRecord,
    ) -> Result<bool>;
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: RwLock<Vec<SearchRecord>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record
    pub async fn records(&self) -> Vec<SearchRecord> {
        self.records.read().await.clone()
    }

    /// Snapshot of the records for one session
    pub async fn session_records(&self, session_id: &str) -> Vec<SearchRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }
}

fn query_matches(record_query: &str, original_query: &str) -> bool {
    record_query.trim().eq_ignore_ascii_case(original_query.trim())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, record: SearchRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn append_click(
        &self,
        session_id: &str,
        original_query: Option<&str>,
        click: ClickRecord,
    ) -> Result<bool> {
        let mut records = self.records.write().await;

        // Most recent record first; prefer a query match when the click
        // carries the original query.
        let position = match original_query {
            Some(query) => records
                .iter()
                .rposition(|r| r.session_id == session_id && query_matches(&r.query, query))
                .or_else(|| records.iter().rposition(|r| r.session_id == session_id)),
            None => records.iter().rposition(|r| r.session_id == session_id),
        };

        match position {
            Some(index) => {
                let record = &mut records[index];
                record.last_click_at = Some(click.clicked_at);
                record.clicks.push(click);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Document store that fails every operation
///
/// Stands in for an unreachable document store in degradation tests.
#[derive(Debug, Default)]
pub struct UnavailableDocumentStore;

#[async_trait]
impl DocumentStore for UnavailableDocumentStore {
    async fn insert(&self, _record: SearchRecord) -> Result<()> {
        Err(GatewayError::analytics("document store unreachable"))
    }

    async fn append_click(
        &self,
        _session_id: &str,
        _original_query: Option<&str>,
        _click: ClickRecord,
    ) -> Result<bool> {
        Err(GatewayError::analytics("document store unreachable"))
    }
}

/// Build a click record stamped now
pub(crate) fn click_record(url: String, title: String, position: usize) -> ClickRecord {
    ClickRecord {
        url,
        title,
        position,
        clicked_at: Utc::now(),
    }
}
