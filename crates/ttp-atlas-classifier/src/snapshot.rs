//! Immutable classifier snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ttp_atlas_core::types::{Modality, TaxonomyVersion, TechniqueId};

use crate::calibration::CalibrationMap;

/// Mean embedding of a technique's confirmed examples, per modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueCentroid {
    /// Element-wise mean of the confirmed example vectors.
    pub vector: Vec<f32>,
    /// Confirmed feedback events backing this centroid. Supervised
    /// eligibility is gated on this count.
    pub confirmations: usize,
}

/// One immutable, shareable classifier state.
///
/// A snapshot is never mutated after construction: recalibration builds a
/// new one and swaps it in. Every `classify` call runs against exactly one
/// snapshot, so its output is internally consistent even while a swap
/// happens concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSnapshot {
    /// Unique snapshot identifier, for audit and logging.
    pub id: Uuid,
    /// When this snapshot was built.
    pub created_at: DateTime<Utc>,
    /// Taxonomy version the snapshot was built against.
    pub taxonomy_version: TaxonomyVersion,
    centroids: HashMap<Modality, HashMap<TechniqueId, TechniqueCentroid>>,
    descriptions: HashMap<Modality, HashMap<TechniqueId, Vec<f32>>>,
    calibration: CalibrationMap,
}

impl ClassifierSnapshot {
    /// An empty snapshot with no signal for any modality.
    ///
    /// Useful at bootstrap, before description embeddings are loaded:
    /// every `classify` call returns an empty candidate list.
    #[must_use]
    pub fn empty(taxonomy_version: TaxonomyVersion) -> Self {
        SnapshotBuilder::new(taxonomy_version).build()
    }

    /// Centroids for one modality, if any.
    #[must_use]
    pub fn centroids_for(
        &self,
        modality: Modality,
    ) -> Option<&HashMap<TechniqueId, TechniqueCentroid>> {
        self.centroids.get(&modality)
    }

    /// Description embeddings for one modality, if any.
    #[must_use]
    pub fn descriptions_for(
        &self,
        modality: Modality,
    ) -> Option<&HashMap<TechniqueId, Vec<f32>>> {
        self.descriptions.get(&modality)
    }

    /// The calibration map in effect for this snapshot.
    #[must_use]
    pub fn calibration(&self) -> &CalibrationMap {
        &self.calibration
    }

    /// True if either scoring path has signal for this modality.
    #[must_use]
    pub fn has_signal_for(&self, modality: Modality) -> bool {
        self.centroids
            .get(&modality)
            .is_some_and(|m| !m.is_empty())
            || self
                .descriptions
                .get(&modality)
                .is_some_and(|m| !m.is_empty())
    }
}

/// Builder assembling a new [`ClassifierSnapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    taxonomy_version: TaxonomyVersion,
    centroids: HashMap<Modality, HashMap<TechniqueId, TechniqueCentroid>>,
    descriptions: HashMap<Modality, HashMap<TechniqueId, Vec<f32>>>,
    calibration: CalibrationMap,
}

impl SnapshotBuilder {
    /// Start a snapshot against one taxonomy version.
    #[must_use]
    pub fn new(taxonomy_version: TaxonomyVersion) -> Self {
        Self {
            taxonomy_version,
            centroids: HashMap::new(),
            descriptions: HashMap::new(),
            calibration: CalibrationMap::identity(),
        }
    }

    /// Add a technique description embedding for a modality.
    #[must_use]
    pub fn description(
        mut self,
        modality: Modality,
        technique_id: TechniqueId,
        vector: Vec<f32>,
    ) -> Self {
        self.descriptions
            .entry(modality)
            .or_default()
            .insert(technique_id, vector);
        self
    }

    /// Carry every description embedding over from a previous snapshot.
    ///
    /// Description embeddings come from the external embedding models, not
    /// from feedback, so recalibration keeps them as-is.
    #[must_use]
    pub fn inherit_descriptions(mut self, previous: &ClassifierSnapshot) -> Self {
        self.descriptions = previous.descriptions.clone();
        self
    }

    /// Add a supervised centroid for a technique and modality.
    #[must_use]
    pub fn centroid(
        mut self,
        modality: Modality,
        technique_id: TechniqueId,
        centroid: TechniqueCentroid,
    ) -> Self {
        self.centroids
            .entry(modality)
            .or_default()
            .insert(technique_id, centroid);
        self
    }

    /// Install a fitted calibration map.
    #[must_use]
    pub fn calibration(mut self, map: CalibrationMap) -> Self {
        self.calibration = map;
        self
    }

    /// Finalize the snapshot.
    #[must_use]
    pub fn build(self) -> ClassifierSnapshot {
        ClassifierSnapshot {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            taxonomy_version: self.taxonomy_version,
            centroids: self.centroids,
            descriptions: self.descriptions,
            calibration: self.calibration,
        }
    }
}
