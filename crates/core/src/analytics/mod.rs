//! Durable analytics for search and click events
//!
//! Query facts are written fire-and-forget at search time; click events
//! arrive independently and are merged into the matching record by session.
//! Analytics must never fail or delay the user-facing response, so every
//! write in this module is best-effort.

pub mod recorder;
pub mod store;
pub mod types;

pub use recorder::AnalyticsRecorder;
pub use store::{DocumentStore, MemoryDocumentStore, UnavailableDocumentStore};
pub use types::{BatchSummary, ClickEvent, ClickRecord, SearchRecord, SessionClick};
