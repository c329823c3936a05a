//! Committed assignment types and the per-document lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::embedding::EmbeddingProvenance;
use super::feedback::{FeedbackEvent, FeedbackVerdict};
use super::taxonomy::TaxonomyVersion;
use super::technique::TechniqueId;

/// A technique accepted into an assignment by the ontology mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedTechnique {
    /// The committed technique (after any deprecation substitution).
    pub technique_id: TechniqueId,
    /// Calibrated confidence the candidate carried.
    pub confidence: f32,
    /// Set when the mapper substituted a successor for a deprecated
    /// candidate; names the original technique.
    #[serde(default)]
    pub provenance: Option<String>,
}

/// One committed classification decision for a document.
///
/// Immutable once persisted. Re-running classification appends a new
/// revision; prior revisions remain queryable for audit. An empty
/// `techniques` set is the explicit "no confident match" outcome, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Source document.
    pub document_id: Uuid,
    /// Revision number, starting at 1 and strictly increasing per document.
    pub revision: u32,
    /// Accepted techniques; empty means "no confident match".
    pub techniques: Vec<CommittedTechnique>,
    /// Taxonomy version the decision was made against.
    pub taxonomy_version: TaxonomyVersion,
    /// Highest committed confidence, 0.0 for an empty assignment.
    pub aggregate_confidence: f32,
    /// Decision timestamp.
    pub decided_at: DateTime<Utc>,
    /// Monotonic logical counter disambiguating equal timestamps.
    pub decision_seq: u64,
    /// Which embedding records contributed to the decision.
    pub provenance: Vec<EmbeddingProvenance>,
}

impl Assignment {
    /// True if this revision committed no technique.
    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        self.techniques.is_empty()
    }

    /// Committed technique identifiers in committed order.
    pub fn technique_ids(&self) -> impl Iterator<Item = &TechniqueId> {
        self.techniques.iter().map(|t| &t.technique_id)
    }
}

/// Lifecycle state of one document's classification.
///
/// Derived, never stored: the assignment history and feedback ledger
/// together determine the state.
///
/// `Unclassified -> Classified -> Disputed -> Reclassified`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentState {
    /// No assignment revision exists.
    #[default]
    Unclassified,
    /// The latest revision stands unchallenged.
    Classified,
    /// A correction was recorded after the latest revision.
    Disputed,
    /// A revision was committed after a correction.
    Reclassified,
}

impl DocumentState {
    /// Derive the lifecycle state from the latest assignment and the
    /// latest correction (confirmations never dispute an assignment).
    ///
    /// `latest_correction` is the newest [`FeedbackEvent`] for the document
    /// whose verdict is [`FeedbackVerdict::Corrected`], if any.
    #[must_use]
    pub fn derive(
        latest_assignment: Option<&Assignment>,
        latest_correction: Option<&FeedbackEvent>,
    ) -> DocumentState {
        let Some(assignment) = latest_assignment else {
            return DocumentState::Unclassified;
        };
        match latest_correction {
            None => DocumentState::Classified,
            Some(correction) => {
                debug_assert!(matches!(correction.verdict, FeedbackVerdict::Corrected(_)));
                if correction.recorded_at > assignment.decided_at {
                    DocumentState::Disputed
                } else {
                    DocumentState::Reclassified
                }
            }
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Unclassified => f.write_str("unclassified"),
            DocumentState::Classified => f.write_str("classified"),
            DocumentState::Disputed => f.write_str("disputed"),
            DocumentState::Reclassified => f.write_str("reclassified"),
        }
    }
}
