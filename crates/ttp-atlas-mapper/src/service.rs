//! Orchestrator-facing service surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use ttp_atlas_classifier::{ClassifierEngine, ClassifierResult, ClassifierSnapshot};
use ttp_atlas_core::error::{CoreError, CoreResult};
use ttp_atlas_core::ingest::EmbeddingIngestAdapter;
use ttp_atlas_core::traits::{AssignmentStore, FeedbackLedger, TaxonomyStore};
use ttp_atlas_core::types::{
    sort_ranked, Assignment, ClassificationCandidate, DocumentState, EmbeddingRecord,
    FeedbackEvent, RawEmbedding,
};

use crate::mapper::OntologyMapper;

/// Wires the ingest adapter, classifier engine, ontology mapper, and
/// feedback ledger into the entry points the orchestrator calls.
///
/// All entry points are safe to retry: a retried
/// [`classify_and_commit`](Self::classify_and_commit) appends a new
/// revision with identical content (an explicit re-decision, preserved for
/// audit), and a retried [`submit_feedback`](Self::submit_feedback)
/// appends a new ledger event.
pub struct AtlasService {
    adapter: EmbeddingIngestAdapter,
    engine: Arc<ClassifierEngine>,
    mapper: OntologyMapper,
    taxonomy: Arc<dyn TaxonomyStore>,
    assignments: Arc<dyn AssignmentStore>,
    ledger: Arc<dyn FeedbackLedger>,
    /// Normalized embeddings per document, kept as labeled examples for
    /// the next recalibration.
    examples: DashMap<Uuid, Vec<EmbeddingRecord>>,
}

impl AtlasService {
    /// Assemble the service from its collaborators.
    pub fn new(
        adapter: EmbeddingIngestAdapter,
        engine: Arc<ClassifierEngine>,
        mapper: OntologyMapper,
        taxonomy: Arc<dyn TaxonomyStore>,
        assignments: Arc<dyn AssignmentStore>,
        ledger: Arc<dyn FeedbackLedger>,
    ) -> Self {
        Self {
            adapter,
            engine,
            mapper,
            taxonomy,
            assignments,
            ledger,
            examples: DashMap::new(),
        }
    }

    /// Normalize, classify, and commit one document's embeddings.
    ///
    /// All embeddings are validated up front — one rejected embedding
    /// fails the whole call with the violated constraint, so upstream
    /// never half-classifies a document. All records score against one
    /// snapshot captured at call start; candidates merge across records by
    /// max confidence per technique before the mapper's policy applies.
    ///
    /// # Errors
    ///
    /// [`CoreError::Rejection`] for schema violations,
    /// [`CoreError::RevisionConflict`] on a lost commit race (retry), or
    /// store errors.
    pub async fn classify_and_commit(
        &self,
        document_id: Uuid,
        raw_embeddings: Vec<RawEmbedding>,
    ) -> CoreResult<Assignment> {
        let mut records = Vec::with_capacity(raw_embeddings.len());
        for raw in raw_embeddings {
            if raw.document_id != document_id {
                return Err(CoreError::Validation {
                    field: "document_id".to_string(),
                    message: format!(
                        "embedding for document {} submitted under document {}",
                        raw.document_id, document_id
                    ),
                });
            }
            records.push(self.adapter.normalize(raw)?);
        }

        let snapshot = self.engine.current_snapshot()?;
        let candidates = self.merge_candidates(&snapshot, &records);
        let provenance = records.iter().map(EmbeddingRecord::provenance).collect();

        let assignment = self
            .mapper
            .commit(
                document_id,
                &candidates,
                snapshot.taxonomy_version,
                provenance,
            )
            .await?;

        self.examples.insert(document_id, records);
        Ok(assignment)
    }

    /// Merge per-record candidate lists into one document-level ranking,
    /// keeping the best confidence per technique.
    fn merge_candidates(
        &self,
        snapshot: &ClassifierSnapshot,
        records: &[EmbeddingRecord],
    ) -> Vec<ClassificationCandidate> {
        let mut best: BTreeMap<_, ClassificationCandidate> = BTreeMap::new();
        for record in records {
            for candidate in self.engine.classify_with(snapshot, record) {
                match best.get(&candidate.technique_id) {
                    Some(existing) if existing.confidence >= candidate.confidence => {}
                    _ => {
                        best.insert(candidate.technique_id.clone(), candidate);
                    }
                }
            }
        }
        let mut merged: Vec<ClassificationCandidate> = best.into_values().collect();
        sort_ranked(&mut merged);
        merged
    }

    /// Record reviewer feedback on an assignment revision.
    ///
    /// Validates that the referenced revision exists before appending.
    /// When the accumulated feedback reaches the configured threshold, a
    /// recalibration runs inline; its failure is logged and never fails
    /// the feedback submission (the previous snapshot stays active).
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] if the referenced assignment revision
    /// does not exist.
    pub async fn submit_feedback(&self, event: FeedbackEvent) -> CoreResult<u64> {
        let history = self.assignments.history(event.document_id).await?;
        let exists = history
            .iter()
            .any(|a| a.revision == event.assignment_revision);
        if !exists {
            return Err(CoreError::Validation {
                field: "assignment_revision".to_string(),
                message: format!(
                    "no assignment revision {} exists for document {}",
                    event.assignment_revision, event.document_id
                ),
            });
        }

        let seq = self.ledger.record(event).await?;

        if self.engine.note_feedback() {
            info!("feedback threshold reached, recalibrating");
            if let Err(err) = self.recalibrate_now().await {
                warn!(error = %err, "scheduled recalibration failed, previous snapshot stays active");
            }
        }
        Ok(seq)
    }

    /// Rebuild the classifier snapshot from the full feedback record now.
    ///
    /// Exposed for the orchestrator's scheduled recalibrations; also
    /// invoked automatically by the feedback-count trigger.
    pub async fn recalibrate_now(&self) -> ClassifierResult<Arc<ClassifierSnapshot>> {
        let examples = self
            .examples
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        self.engine
            .recalibrate(
                self.taxonomy.as_ref(),
                self.assignments.as_ref(),
                self.ledger.as_ref(),
                &examples,
            )
            .await
    }

    /// Latest assignment revision, `None` while unclassified.
    pub async fn assignment(&self, document_id: Uuid) -> CoreResult<Option<Assignment>> {
        self.mapper.assignment(document_id).await
    }

    /// Full assignment history for a document, oldest revision first.
    pub async fn history(&self, document_id: Uuid) -> CoreResult<Vec<Assignment>> {
        self.mapper.history(document_id).await
    }

    /// Lifecycle state of a document's classification.
    pub async fn state(&self, document_id: Uuid) -> CoreResult<DocumentState> {
        let latest = self.assignments.latest(document_id).await?;
        let events = self.ledger.events_for(document_id).await?;
        let latest_correction = events.iter().rev().find(|e| e.is_correction());
        Ok(DocumentState::derive(latest.as_ref(), latest_correction))
    }
}
