//! Human feedback events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::technique::TechniqueId;

/// Reviewer verdict on an assignment revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackVerdict {
    /// The assignment's techniques are correct as committed.
    Confirmed,
    /// The document actually maps to these techniques instead.
    Corrected(Vec<TechniqueId>),
}

/// One append-only human validation or correction event.
///
/// Events are never edited or deleted; a reviewer changing their mind is a
/// new event. `seq` is assigned by the ledger at append time and, together
/// with `recorded_at`, totally orders one document's events even when
/// clocks tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// Document the feedback is about.
    pub document_id: Uuid,
    /// Reviewer identifier.
    pub reviewer: String,
    /// The assignment revision that was reviewed.
    pub assignment_revision: u32,
    /// The reviewer's verdict.
    pub verdict: FeedbackVerdict,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Per-document append sequence, assigned by the ledger. Zero until
    /// recorded.
    #[serde(default)]
    pub seq: u64,
}

impl FeedbackEvent {
    /// Build an event pending ledger append (`seq` unassigned).
    #[must_use]
    pub fn new(
        document_id: Uuid,
        reviewer: impl Into<String>,
        assignment_revision: u32,
        verdict: FeedbackVerdict,
    ) -> Self {
        Self {
            document_id,
            reviewer: reviewer.into(),
            assignment_revision,
            verdict,
            recorded_at: Utc::now(),
            seq: 0,
        }
    }

    /// True if the verdict corrects the assignment.
    #[must_use]
    pub fn is_correction(&self) -> bool {
        matches!(self.verdict, FeedbackVerdict::Corrected(_))
    }

    /// The techniques this event endorses as ground truth: the corrected
    /// set for corrections, `None` for confirmations (the assignment's own
    /// set is the truth there).
    #[must_use]
    pub fn corrected_techniques(&self) -> Option<&[TechniqueId]> {
        match &self.verdict {
            FeedbackVerdict::Confirmed => None,
            FeedbackVerdict::Corrected(ids) => Some(ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_has_unassigned_seq() {
        let event = FeedbackEvent::new(Uuid::new_v4(), "analyst", 1, FeedbackVerdict::Confirmed);
        assert_eq!(event.seq, 0);
        assert!(!event.is_correction());
        assert!(event.corrected_techniques().is_none());
    }

    #[test]
    fn test_correction_exposes_corrected_set() {
        let fix = vec![TechniqueId::new("T1059").unwrap()];
        let event = FeedbackEvent::new(
            Uuid::new_v4(),
            "analyst",
            2,
            FeedbackVerdict::Corrected(fix.clone()),
        );
        assert!(event.is_correction());
        assert_eq!(event.corrected_techniques().unwrap(), fix.as_slice());
    }
}
