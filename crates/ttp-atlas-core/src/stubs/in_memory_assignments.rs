//! In-memory assignment store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::traits::AssignmentStore;
use crate::types::Assignment;

/// In-memory implementation of [`AssignmentStore`].
///
/// Per-document revision vectors live under `DashMap` entries; the entry
/// lock serializes appends for one document, which is exactly the ordering
/// guarantee the contract asks for. Appends to different documents do not
/// contend.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    data: DashMap<Uuid, Vec<Assignment>>,
    max_seq: AtomicU64,
}

impl InMemoryAssignmentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents with at least one revision.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.data.len()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn append(&self, assignment: Assignment) -> CoreResult<()> {
        let mut entry = self.data.entry(assignment.document_id).or_default();

        let expected = entry.len() as u32 + 1;
        if assignment.revision != expected {
            return Err(CoreError::RevisionConflict {
                document_id: assignment.document_id,
                expected,
                actual: assignment.revision,
            });
        }
        if let Some(previous) = entry.last() {
            let ordered = (assignment.decided_at, assignment.decision_seq)
                > (previous.decided_at, previous.decision_seq);
            if !ordered {
                return Err(CoreError::RevisionConflict {
                    document_id: assignment.document_id,
                    expected,
                    actual: assignment.revision,
                });
            }
        }

        debug!(
            document_id = %assignment.document_id,
            revision = assignment.revision,
            techniques = assignment.techniques.len(),
            "appended assignment revision"
        );
        self.max_seq
            .fetch_max(assignment.decision_seq, Ordering::AcqRel);
        entry.push(assignment);
        Ok(())
    }

    async fn latest(&self, document_id: Uuid) -> CoreResult<Option<Assignment>> {
        Ok(self
            .data
            .get(&document_id)
            .and_then(|revisions| revisions.last().cloned()))
    }

    async fn history(&self, document_id: Uuid) -> CoreResult<Vec<Assignment>> {
        Ok(self
            .data
            .get(&document_id)
            .map(|revisions| revisions.value().clone())
            .unwrap_or_default())
    }

    async fn last_decision_seq(&self) -> CoreResult<u64> {
        Ok(self.max_seq.load(Ordering::Acquire))
    }
}
