//! Classifier engine: scoring, snapshot management, recalibration.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ttp_atlas_core::config::ClassifierConfig;
use ttp_atlas_core::similarity::mean_vector;
use ttp_atlas_core::traits::{AssignmentStore, FeedbackLedger, TaxonomyStore};
use ttp_atlas_core::types::{
    sort_ranked, ClassificationCandidate, EmbeddingRecord, Modality, ScoringMethod, TechniqueId,
};

use crate::calibration::CalibrationMap;
use crate::error::{ClassifierError, ClassifierResult};
use crate::snapshot::{ClassifierSnapshot, SnapshotBuilder, TechniqueCentroid};
use crate::{supervised, zeroshot};

/// Normalized embeddings per document, used as labeled examples during
/// recalibration.
pub type LabeledExamples = HashMap<Uuid, Vec<EmbeddingRecord>>;

/// Scores embeddings against the active [`ClassifierSnapshot`].
///
/// # Concurrency
///
/// `classify` captures the active snapshot once (an `Arc` clone) and runs
/// entirely against it; [`recalibrate`](Self::recalibrate) builds a new
/// snapshot aside and installs it with an atomic swap of the shared
/// reference. Readers in flight keep the snapshot they started with.
pub struct ClassifierEngine {
    config: ClassifierConfig,
    snapshot: RwLock<Arc<ClassifierSnapshot>>,
    feedback_pending: AtomicUsize,
}

impl ClassifierEngine {
    /// Create an engine serving `initial` until the first recalibration.
    #[must_use]
    pub fn new(config: ClassifierConfig, initial: ClassifierSnapshot) -> Self {
        Self {
            config,
            snapshot: RwLock::new(Arc::new(initial)),
            feedback_pending: AtomicUsize::new(0),
        }
    }

    /// The currently active snapshot.
    pub fn current_snapshot(&self) -> ClassifierResult<Arc<ClassifierSnapshot>> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| ClassifierError::Poisoned)
    }

    /// Classify one embedding record into ranked technique candidates.
    ///
    /// Per technique the two scoring paths combine by weighted max:
    /// `max(supervised_weight * supervised, zero_shot)`, supervised
    /// winning ties once eligible. The calibration map turns the winning
    /// raw score into the candidate's confidence, and the ranked sequence
    /// is truncated to `top_n` — descending confidence, ties broken by
    /// ascending technique identifier.
    ///
    /// An empty result means the snapshot has no signal for the record's
    /// modality; that is a valid outcome, not an error.
    pub fn classify(
        &self,
        record: &EmbeddingRecord,
    ) -> ClassifierResult<Vec<ClassificationCandidate>> {
        let snapshot = self.current_snapshot()?;
        Ok(self.classify_with(&snapshot, record))
    }

    /// Classify against an explicitly captured snapshot.
    ///
    /// Callers scoring several records for one document capture the
    /// snapshot once and use it for all of them, so one assignment is
    /// never computed against two snapshots even if a recalibration swap
    /// lands mid-document.
    pub fn classify_with(
        &self,
        snapshot: &ClassifierSnapshot,
        record: &EmbeddingRecord,
    ) -> Vec<ClassificationCandidate> {
        let mut combined: BTreeMap<TechniqueId, (f32, ScoringMethod)> = BTreeMap::new();
        for (id, raw) in zeroshot::score(record, snapshot) {
            combined.insert(id, (raw, ScoringMethod::ZeroShot));
        }
        for (id, raw) in supervised::score(record, snapshot, self.config.supervised_min_confirmations)
        {
            let weighted = raw * self.config.supervised_weight;
            combined
                .entry(id)
                .and_modify(|slot| {
                    if weighted >= slot.0 {
                        *slot = (weighted, ScoringMethod::Supervised);
                    }
                })
                .or_insert((weighted, ScoringMethod::Supervised));
        }

        let mut candidates: Vec<ClassificationCandidate> = combined
            .into_iter()
            .map(|(technique_id, (raw, method))| ClassificationCandidate {
                technique_id,
                taxonomy_version: snapshot.taxonomy_version,
                confidence: snapshot.calibration().apply(raw),
                method,
            })
            .collect();
        sort_ranked(&mut candidates);
        candidates.truncate(self.config.top_n);

        debug!(
            document_id = %record.document_id,
            modality = %record.modality,
            candidates = candidates.len(),
            snapshot_id = %snapshot.id,
            "classified embedding record"
        );
        candidates
    }

    /// Count one new feedback event toward the recalibration trigger.
    ///
    /// Returns true once the configured threshold of events has
    /// accumulated since the last successful recalibration; the caller
    /// then schedules [`recalibrate`](Self::recalibrate).
    pub fn note_feedback(&self) -> bool {
        let seen = self.feedback_pending.fetch_add(1, Ordering::AcqRel) + 1;
        seen >= self.config.recalibration_event_threshold
    }

    /// Rebuild the snapshot from the full feedback record and swap it in.
    ///
    /// Reads the ledger, joins events with their reviewed assignment
    /// revisions, accumulates per-(modality, technique) centroids from
    /// `examples`, refits the calibration map, and atomically installs the
    /// result. Description embeddings are inherited from the active
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Any failure leaves the previous snapshot active and the feedback
    /// counter untouched; a half-built snapshot is never served.
    pub async fn recalibrate(
        &self,
        taxonomy: &dyn TaxonomyStore,
        assignments: &dyn AssignmentStore,
        ledger: &dyn FeedbackLedger,
        examples: &LabeledExamples,
    ) -> ClassifierResult<Arc<ClassifierSnapshot>> {
        let version = taxonomy.latest().await?.ok_or_else(|| {
            ClassifierError::Recalibration("no taxonomy version published".into())
        })?;
        let taxonomy_snapshot = taxonomy.snapshot(version).await?;
        let events = ledger.events_since(DateTime::<Utc>::MIN_UTC).await?;

        let mut confirmations: HashMap<TechniqueId, usize> = HashMap::new();
        let mut clusters: HashMap<(Modality, TechniqueId), Vec<Vec<f32>>> = HashMap::new();
        let mut outcomes: Vec<(f32, bool)> = Vec::new();

        for event in &events {
            let history = assignments.history(event.document_id).await?;
            let Some(assignment) = history
                .iter()
                .find(|a| a.revision == event.assignment_revision)
            else {
                warn!(
                    document_id = %event.document_id,
                    revision = event.assignment_revision,
                    "feedback references unknown assignment revision, skipping"
                );
                continue;
            };

            let labeled: Vec<TechniqueId> = match event.corrected_techniques() {
                None => assignment.technique_ids().cloned().collect(),
                Some(ids) => ids.to_vec(),
            };

            for committed in &assignment.techniques {
                let endorsed = labeled.contains(&committed.technique_id);
                outcomes.push((committed.confidence, endorsed));
            }

            for id in labeled {
                if !taxonomy_snapshot.contains(&id) {
                    warn!(
                        technique_id = %id,
                        version = %version,
                        "feedback labels a technique absent from the current taxonomy, skipping"
                    );
                    continue;
                }
                *confirmations.entry(id.clone()).or_default() += 1;
                if let Some(records) = examples.get(&event.document_id) {
                    for record in records {
                        clusters
                            .entry((record.modality, id.clone()))
                            .or_default()
                            .push(record.vector.clone());
                    }
                }
            }
        }

        let previous = self.current_snapshot()?;
        let mut builder = SnapshotBuilder::new(version).inherit_descriptions(&previous);

        for ((modality, id), vectors) in clusters {
            let Some(centroid) = dominant_dimension_mean(&vectors) else {
                warn!(
                    technique_id = %id,
                    modality = %modality,
                    "no coherent example dimension for centroid, skipping"
                );
                continue;
            };
            let count = confirmations.get(&id).copied().unwrap_or(0);
            builder = builder.centroid(
                modality,
                id,
                TechniqueCentroid {
                    vector: centroid,
                    confirmations: count,
                },
            );
        }

        let calibration = CalibrationMap::fit(&outcomes, self.config.calibration_min_events);
        let fitted = !calibration.is_identity();
        let new_snapshot = Arc::new(builder.calibration(calibration).build());

        {
            let mut guard = self.snapshot.write().map_err(|_| ClassifierError::Poisoned)?;
            *guard = Arc::clone(&new_snapshot);
        }
        self.feedback_pending.store(0, Ordering::Release);

        info!(
            snapshot_id = %new_snapshot.id,
            taxonomy_version = %version,
            events = events.len(),
            calibration_fitted = fitted,
            "recalibrated classifier snapshot"
        );
        Ok(new_snapshot)
    }
}

/// Mean of the vectors sharing the most common dimension.
///
/// Examples for one technique can mix producing models; only vectors of
/// the dominant dimension contribute (smallest dimension wins a count
/// tie, for determinism).
fn dominant_dimension_mean(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let mut by_dim: BTreeMap<usize, Vec<&[f32]>> = BTreeMap::new();
    for v in vectors {
        if !v.is_empty() {
            by_dim.entry(v.len()).or_default().push(v.as_slice());
        }
    }
    let (_, group) = by_dim.into_iter().max_by_key(|(dim, group)| {
        // BTreeMap iteration is ascending by dim; max_by_key keeps the
        // LAST maximum, so invert the dim to prefer the smallest on ties.
        (group.len(), usize::MAX - *dim)
    })?;
    mean_vector(&group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use ttp_atlas_core::types::TaxonomyVersion;

    fn record(modality: Modality, vector: Vec<f32>) -> EmbeddingRecord {
        let dimension = vector.len();
        EmbeddingRecord {
            document_id: Uuid::new_v4(),
            modality,
            vector,
            dimension,
            model_id: "minilm".to_string(),
            model_version: "1.0".to_string(),
        }
    }

    fn tid(raw: &str) -> TechniqueId {
        TechniqueId::new(raw).unwrap()
    }

    fn engine_with_descriptions(pairs: &[(&str, Vec<f32>)]) -> ClassifierEngine {
        let mut builder = SnapshotBuilder::new(TaxonomyVersion::FIRST);
        for (id, vector) in pairs {
            builder = builder.description(Modality::Text, tid(id), vector.clone());
        }
        ClassifierEngine::new(ClassifierConfig::default(), builder.build())
    }

    #[test]
    fn test_output_sorted_descending_with_identifier_tie_break() {
        // Two techniques with identical description embeddings score
        // identically; the tie must break by ascending identifier.
        let engine = engine_with_descriptions(&[
            ("T1566", vec![1.0, 0.0]),
            ("T1059", vec![1.0, 0.0]),
            ("T1190", vec![0.0, 1.0]),
        ]);
        let candidates = engine.classify(&record(Modality::Text, vec![1.0, 0.0])).unwrap();

        assert_eq!(candidates[0].technique_id.as_str(), "T1059");
        assert_eq!(candidates[1].technique_id.as_str(), "T1566");
        assert_eq!(candidates[2].technique_id.as_str(), "T1190");
        assert!(candidates[0].confidence >= candidates[1].confidence);
        assert!(candidates[1].confidence > candidates[2].confidence);
    }

    #[test]
    fn test_truncated_to_top_n() {
        let config = ClassifierConfig {
            top_n: 2,
            ..ClassifierConfig::default()
        };
        let mut builder = SnapshotBuilder::new(TaxonomyVersion::FIRST);
        for id in ["T1001", "T1002", "T1003", "T1004"] {
            builder = builder.description(Modality::Text, tid(id), vec![1.0, 0.0]);
        }
        let engine = ClassifierEngine::new(config, builder.build());

        let candidates = engine.classify(&record(Modality::Text, vec![1.0, 0.0])).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].technique_id.as_str(), "T1001");
    }

    #[test]
    fn test_modality_without_signal_yields_empty() {
        let engine = engine_with_descriptions(&[("T1059", vec![1.0, 0.0])]);
        let candidates = engine.classify(&record(Modality::Image, vec![1.0, 0.0])).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_supervised_beats_zero_shot_once_eligible() {
        // Zero-shot description points away from the query; the confirmed
        // centroid points at it. Supervised must win and be tagged so.
        let snapshot = SnapshotBuilder::new(TaxonomyVersion::FIRST)
            .description(Modality::Text, tid("T1059"), vec![0.0, 1.0])
            .centroid(
                Modality::Text,
                tid("T1059"),
                TechniqueCentroid {
                    vector: vec![1.0, 0.0],
                    confirmations: 5,
                },
            )
            .build();
        let engine = ClassifierEngine::new(ClassifierConfig::default(), snapshot);

        let candidates = engine.classify(&record(Modality::Text, vec![1.0, 0.0])).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].method, ScoringMethod::Supervised);
        assert!((candidates[0].confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ineligible_centroid_falls_back_to_zero_shot() {
        let snapshot = SnapshotBuilder::new(TaxonomyVersion::FIRST)
            .description(Modality::Text, tid("T1059"), vec![0.0, 1.0])
            .centroid(
                Modality::Text,
                tid("T1059"),
                TechniqueCentroid {
                    vector: vec![1.0, 0.0],
                    confirmations: 2,
                },
            )
            .build();
        let engine = ClassifierEngine::new(ClassifierConfig::default(), snapshot);

        let candidates = engine.classify(&record(Modality::Text, vec![1.0, 0.0])).unwrap();
        assert_eq!(candidates[0].method, ScoringMethod::ZeroShot);
    }

    #[test]
    fn test_note_feedback_trips_at_threshold() {
        let config = ClassifierConfig {
            recalibration_event_threshold: 3,
            ..ClassifierConfig::default()
        };
        let engine = ClassifierEngine::new(
            config,
            ClassifierSnapshot::empty(TaxonomyVersion::FIRST),
        );
        assert!(!engine.note_feedback());
        assert!(!engine.note_feedback());
        assert!(engine.note_feedback());
    }

    #[test]
    fn test_dominant_dimension_mean_ignores_minority_dimension() {
        let vectors = vec![vec![1.0, 1.0], vec![3.0, 3.0], vec![1.0, 2.0, 3.0]];
        let mean = dominant_dimension_mean(&vectors).unwrap();
        assert_eq!(mean, vec![2.0, 2.0]);
    }
}
