//! Supervised scoring path: nearest-centroid over confirmed examples.

use std::collections::HashMap;

use ttp_atlas_core::similarity::{cosine_similarity, similarity_to_unit};
use ttp_atlas_core::types::{EmbeddingRecord, TechniqueId};

use crate::snapshot::ClassifierSnapshot;

/// Raw supervised scores for every eligible technique.
///
/// A technique is eligible once its centroid for the record's modality is
/// backed by at least `min_confirmations` confirmed feedback events and
/// matches the record's dimension. Ineligible techniques are absent from
/// the result, leaving them to the zero-shot path.
pub(crate) fn score(
    record: &EmbeddingRecord,
    snapshot: &ClassifierSnapshot,
    min_confirmations: usize,
) -> HashMap<TechniqueId, f32> {
    let Some(centroids) = snapshot.centroids_for(record.modality) else {
        return HashMap::new();
    };

    centroids
        .iter()
        .filter(|(_, centroid)| {
            centroid.confirmations >= min_confirmations
                && centroid.vector.len() == record.vector.len()
        })
        .map(|(id, centroid)| {
            let sim = cosine_similarity(&record.vector, &centroid.vector);
            (id.clone(), similarity_to_unit(sim))
        })
        .collect()
}
