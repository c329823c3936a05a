//! Feedback ledger trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::FeedbackEvent;

/// Pure append-only log of human validation and correction events.
///
/// No update or delete contract exists. Appends for one document are
/// serialized so that document's event order is stable; appends across
/// documents are unordered relative to each other.
#[async_trait]
pub trait FeedbackLedger: Send + Sync {
    /// Append one event, returning the assigned per-document sequence
    /// number as the append confirmation.
    async fn record(&self, event: FeedbackEvent) -> CoreResult<u64>;

    /// All events recorded at or after `since`, ordered by
    /// `(recorded_at, seq)`.
    ///
    /// Finite and restartable: a consumer resumes by passing the last
    /// timestamp it saw.
    async fn events_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<FeedbackEvent>>;

    /// All events for one document in append order.
    async fn events_for(&self, document_id: Uuid) -> CoreResult<Vec<FeedbackEvent>>;
}
