//! Zero-shot scoring path: similarity to technique description embeddings.

use std::collections::HashMap;

use ttp_atlas_core::similarity::{cosine_similarity, similarity_to_unit};
use ttp_atlas_core::types::{EmbeddingRecord, TechniqueId};

use crate::snapshot::ClassifierSnapshot;

/// Raw zero-shot scores for every technique with a description embedding
/// in the record's modality.
///
/// No eligibility gate: zero-shot is the fallback that covers techniques
/// the supervised path has no confirmed examples for.
pub(crate) fn score(
    record: &EmbeddingRecord,
    snapshot: &ClassifierSnapshot,
) -> HashMap<TechniqueId, f32> {
    let Some(descriptions) = snapshot.descriptions_for(record.modality) else {
        return HashMap::new();
    };

    descriptions
        .iter()
        .filter(|(_, vector)| vector.len() == record.vector.len())
        .map(|(id, vector)| {
            let sim = cosine_similarity(&record.vector, vector);
            (id.clone(), similarity_to_unit(sim))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ClassifierSnapshot, SnapshotBuilder};
    use ttp_atlas_core::types::{Modality, TaxonomyVersion};
    use uuid::Uuid;

    fn record(vector: Vec<f32>) -> EmbeddingRecord {
        let dimension = vector.len();
        EmbeddingRecord {
            document_id: Uuid::new_v4(),
            modality: Modality::Text,
            vector,
            dimension,
            model_id: "minilm".to_string(),
            model_version: "1.0".to_string(),
        }
    }

    #[test]
    fn test_scores_every_described_technique() {
        let t1 = TechniqueId::new("T1059").unwrap();
        let t2 = TechniqueId::new("T1566").unwrap();
        let snapshot = SnapshotBuilder::new(TaxonomyVersion::FIRST)
            .description(Modality::Text, t1.clone(), vec![1.0, 0.0])
            .description(Modality::Text, t2.clone(), vec![0.0, 1.0])
            .build();

        let scores = score(&record(vec![1.0, 0.0]), &snapshot);
        assert_eq!(scores.len(), 2);
        assert!(scores[&t1] > scores[&t2]);
    }

    #[test]
    fn test_no_descriptions_for_modality_yields_empty() {
        let snapshot = ClassifierSnapshot::empty(TaxonomyVersion::FIRST);
        assert!(score(&record(vec![1.0, 0.0]), &snapshot).is_empty());
    }
}
