//! Assignment store trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::Assignment;

/// Append-only store of assignment revisions, keyed by
/// (document, revision).
///
/// The ontology mapper is the only writer. Revisions per document are
/// strictly ordered; the store enforces the ordering at append time so a
/// lost race between concurrent commits surfaces as a conflict instead of
/// silent reordering.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Append one assignment revision.
    ///
    /// The revision must be exactly `latest + 1` (or 1 for the first), and
    /// `(decided_at, decision_seq)` must be strictly greater than the
    /// previous revision's.
    ///
    /// # Errors
    ///
    /// [`CoreError::RevisionConflict`] if ordering would be violated; the
    /// caller retries with fresh state. Nothing is written on error.
    ///
    /// [`CoreError::RevisionConflict`]: crate::error::CoreError::RevisionConflict
    async fn append(&self, assignment: Assignment) -> CoreResult<()>;

    /// Latest revision for a document, `None` if unclassified.
    async fn latest(&self, document_id: Uuid) -> CoreResult<Option<Assignment>>;

    /// All revisions for a document in ascending revision order.
    async fn history(&self, document_id: Uuid) -> CoreResult<Vec<Assignment>>;

    /// Highest decision sequence ever appended, for seeding the mapper's
    /// monotonic counter on restart.
    async fn last_decision_seq(&self) -> CoreResult<u64>;
}
