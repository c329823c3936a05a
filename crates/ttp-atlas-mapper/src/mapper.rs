//! The ontology mapper: candidate resolution and atomic assignment commit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use ttp_atlas_core::config::MapperConfig;
use ttp_atlas_core::error::{CoreError, CoreResult};
use ttp_atlas_core::traits::{AssignmentStore, TaxonomyStore};
use ttp_atlas_core::types::{
    sort_ranked, Assignment, ClassificationCandidate, CommittedTechnique, EmbeddingProvenance,
    TaxonomyVersion, TechniqueId,
};

use crate::policy;

/// Resolves ranked candidates into committed [`Assignment`] revisions.
///
/// The mapper exclusively owns assignment creation. A commit is atomic:
/// every candidate is resolved through the taxonomy store first, and only
/// then is the single store append issued — a cancelled call persists
/// nothing.
pub struct OntologyMapper {
    taxonomy: Arc<dyn TaxonomyStore>,
    assignments: Arc<dyn AssignmentStore>,
    config: MapperConfig,
    decision_seq: AtomicU64,
}

impl OntologyMapper {
    /// Create a mapper, seeding the monotonic decision counter from the
    /// store so restarts never reissue a sequence number.
    pub async fn new(
        taxonomy: Arc<dyn TaxonomyStore>,
        assignments: Arc<dyn AssignmentStore>,
        config: MapperConfig,
    ) -> CoreResult<Self> {
        let last_seq = assignments.last_decision_seq().await?;
        Ok(Self {
            taxonomy,
            assignments,
            config,
            decision_seq: AtomicU64::new(last_seq),
        })
    }

    /// Commit a new assignment revision for a document.
    ///
    /// Applies the acceptance/tie-band policy, then resolves every
    /// accepted candidate through the taxonomy store:
    ///
    /// - a deprecated candidate with a superseding reference is committed
    ///   as its successor, with a provenance note;
    /// - a deprecated candidate without a successor, or an unresolvable
    ///   candidate, is dropped with a data-quality warning — never fatal;
    /// - an empty result commits as an explicit "no confident match".
    ///
    /// # Errors
    ///
    /// [`CoreError::RevisionConflict`] if another commit for the same
    /// document won the race; retry with fresh state. Store errors
    /// propagate as-is.
    pub async fn commit(
        &self,
        document_id: Uuid,
        candidates: &[ClassificationCandidate],
        taxonomy_version: TaxonomyVersion,
        provenance: Vec<EmbeddingProvenance>,
    ) -> CoreResult<Assignment> {
        // Re-establish ranked order locally rather than trusting the
        // caller; policy and tie-break depend on it.
        let mut ranked = candidates.to_vec();
        sort_ranked(&mut ranked);

        let accepted = policy::select_accepted(&ranked, &self.config);

        let mut committed: Vec<CommittedTechnique> = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            match self
                .resolve_candidate(&candidate.technique_id, taxonomy_version)
                .await?
            {
                Some((technique_id, note)) => {
                    if committed.iter().any(|c| c.technique_id == technique_id) {
                        continue;
                    }
                    committed.push(CommittedTechnique {
                        technique_id,
                        confidence: candidate.confidence,
                        provenance: note,
                    });
                }
                None => continue,
            }
        }

        let aggregate_confidence = committed
            .iter()
            .map(|c| c.confidence)
            .fold(0.0f32, f32::max);

        let latest = self.assignments.latest(document_id).await?;
        let revision = latest.map_or(1, |a| a.revision + 1);
        let assignment = Assignment {
            document_id,
            revision,
            techniques: committed,
            taxonomy_version,
            aggregate_confidence,
            decided_at: Utc::now(),
            decision_seq: self.decision_seq.fetch_add(1, Ordering::AcqRel) + 1,
            provenance,
        };

        self.assignments.append(assignment.clone()).await?;
        debug!(
            document_id = %document_id,
            revision,
            techniques = assignment.techniques.len(),
            unmatched = assignment.is_unmatched(),
            "committed assignment revision"
        );
        Ok(assignment)
    }

    /// Resolve one candidate, applying deprecation substitution.
    ///
    /// Returns `Ok(None)` when the candidate must be dropped (unknown
    /// technique, or deprecated with no usable successor).
    async fn resolve_candidate(
        &self,
        id: &TechniqueId,
        version: TaxonomyVersion,
    ) -> CoreResult<Option<(TechniqueId, Option<String>)>> {
        let technique = match self.taxonomy.resolve(id, version).await {
            Ok(t) => t,
            Err(CoreError::TechniqueNotFound { .. }) => {
                warn!(
                    technique_id = %id,
                    version = %version,
                    "candidate technique not found in taxonomy, dropping"
                );
                return Ok(None);
            }
            Err(other) => return Err(other),
        };

        if !technique.deprecated {
            return Ok(Some((technique.id, None)));
        }

        let Some(successor_id) = technique.superseded_by else {
            warn!(
                technique_id = %id,
                version = %version,
                "candidate technique deprecated with no successor, dropping"
            );
            return Ok(None);
        };

        match self.taxonomy.resolve(&successor_id, version).await {
            Ok(successor) => {
                let note = format!("substituted for deprecated {id}");
                Ok(Some((successor.id, Some(note))))
            }
            Err(CoreError::TechniqueNotFound { .. }) => {
                warn!(
                    technique_id = %id,
                    successor_id = %successor_id,
                    version = %version,
                    "successor of deprecated candidate unresolvable, dropping"
                );
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Latest assignment revision, `None` if the document is unclassified.
    pub async fn assignment(&self, document_id: Uuid) -> CoreResult<Option<Assignment>> {
        self.assignments.latest(document_id).await
    }

    /// Full revision history for a document, oldest first.
    pub async fn history(&self, document_id: Uuid) -> CoreResult<Vec<Assignment>> {
        self.assignments.history(document_id).await
    }
}
