//! In-memory feedback ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::traits::FeedbackLedger;
use crate::types::FeedbackEvent;

/// In-memory implementation of [`FeedbackLedger`].
///
/// Append-only: nothing in this type removes or rewrites an event. The
/// `DashMap` entry lock serializes appends per document, keeping that
/// document's sequence numbers gapless and its event order stable.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackLedger {
    events: DashMap<Uuid, Vec<FeedbackEvent>>,
}

impl InMemoryFeedbackLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total recorded events across all documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.iter().map(|entry| entry.len()).sum()
    }

    /// True if no event was ever recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedbackLedger for InMemoryFeedbackLedger {
    async fn record(&self, mut event: FeedbackEvent) -> CoreResult<u64> {
        let mut entry = self.events.entry(event.document_id).or_default();
        let seq = entry.len() as u64 + 1;
        event.seq = seq;
        debug!(
            document_id = %event.document_id,
            reviewer = %event.reviewer,
            seq,
            correction = event.is_correction(),
            "recorded feedback event"
        );
        entry.push(event);
        Ok(seq)
    }

    async fn events_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<FeedbackEvent>> {
        let mut result: Vec<FeedbackEvent> = self
            .events
            .iter()
            .flat_map(|entry| {
                entry
                    .iter()
                    .filter(|e| e.recorded_at >= since)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        result.sort_by_key(|e| (e.recorded_at, e.seq));
        Ok(result)
    }

    async fn events_for(&self, document_id: Uuid) -> CoreResult<Vec<FeedbackEvent>> {
        Ok(self
            .events
            .get(&document_id)
            .map(|events| events.value().clone())
            .unwrap_or_default())
    }
}
