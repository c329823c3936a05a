//! End-to-end service flow: ingest -> classify -> commit -> feedback.

use std::sync::Arc;

use uuid::Uuid;

use ttp_atlas_classifier::{ClassifierEngine, SnapshotBuilder};
use ttp_atlas_core::config::{ClassifierConfig, MapperConfig};
use ttp_atlas_core::error::CoreError;
use ttp_atlas_core::ingest::{EmbeddingIngestAdapter, EmbeddingSchemaRegistry};
use ttp_atlas_core::stubs::{
    InMemoryAssignmentStore, InMemoryFeedbackLedger, InMemoryTaxonomyStore,
};
use ttp_atlas_core::traits::{AssignmentStore, FeedbackLedger, TaxonomyStore};
use ttp_atlas_core::types::{
    DocumentState, FeedbackEvent, FeedbackVerdict, Modality, RawEmbedding, Tactic, Technique,
    TechniqueId,
};
use ttp_atlas_mapper::{AtlasService, OntologyMapper};

fn tid(raw: &str) -> TechniqueId {
    TechniqueId::new(raw).unwrap()
}

fn technique(id: &str) -> Technique {
    Technique {
        id: tid(id),
        name: format!("Technique {id}"),
        description: format!("Description of {id}."),
        tactics: vec![Tactic::Execution],
        deprecated: false,
        superseded_by: None,
    }
}

fn raw(document_id: Uuid, modality: Modality, model: &str, vector: Vec<f32>) -> RawEmbedding {
    RawEmbedding {
        document_id,
        modality,
        vector,
        model_id: model.to_string(),
        model_version: "1.0".to_string(),
    }
}

async fn service() -> AtlasService {
    let taxonomy: Arc<InMemoryTaxonomyStore> = Arc::new(InMemoryTaxonomyStore::new());
    let version = taxonomy
        .publish(vec![technique("T1059"), technique("T1566")])
        .await
        .unwrap();
    let assignments: Arc<InMemoryAssignmentStore> = Arc::new(InMemoryAssignmentStore::new());
    let ledger: Arc<InMemoryFeedbackLedger> = Arc::new(InMemoryFeedbackLedger::new());

    let mut registry = EmbeddingSchemaRegistry::new();
    registry.register(Modality::Text, "minilm", "1.0", 2).unwrap();
    registry.register(Modality::Code, "codebert", "1.0", 2).unwrap();
    let adapter = EmbeddingIngestAdapter::new(registry);

    // T1059 descriptions point at [1, 0] in both modalities; T1566 at
    // [0, 1] in text only.
    let snapshot = SnapshotBuilder::new(version)
        .description(Modality::Text, tid("T1059"), vec![1.0, 0.0])
        .description(Modality::Code, tid("T1059"), vec![1.0, 0.0])
        .description(Modality::Text, tid("T1566"), vec![0.0, 1.0])
        .build();
    let engine = Arc::new(ClassifierEngine::new(ClassifierConfig::default(), snapshot));

    let mapper = OntologyMapper::new(
        Arc::clone(&taxonomy) as Arc<dyn TaxonomyStore>,
        Arc::clone(&assignments) as Arc<dyn AssignmentStore>,
        MapperConfig::default(),
    )
    .await
    .unwrap();

    AtlasService::new(
        adapter,
        engine,
        mapper,
        taxonomy,
        assignments,
        ledger as Arc<dyn FeedbackLedger>,
    )
}

#[tokio::test]
async fn classify_and_commit_produces_queryable_assignment() {
    let service = service().await;
    let doc = Uuid::new_v4();

    let assignment = service
        .classify_and_commit(
            doc,
            vec![
                raw(doc, Modality::Text, "minilm", vec![1.0, 0.0]),
                raw(doc, Modality::Code, "codebert", vec![0.9, 0.1]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(assignment.revision, 1);
    assert_eq!(assignment.techniques[0].technique_id.as_str(), "T1059");
    assert_eq!(assignment.provenance.len(), 2);

    let fetched = service.assignment(doc).await.unwrap().unwrap();
    assert_eq!(fetched.revision, 1);
    assert_eq!(service.state(doc).await.unwrap(), DocumentState::Classified);
}

#[tokio::test]
async fn one_rejected_embedding_fails_the_whole_call() {
    let service = service().await;
    let doc = Uuid::new_v4();

    let result = service
        .classify_and_commit(
            doc,
            vec![
                raw(doc, Modality::Text, "minilm", vec![1.0, 0.0]),
                raw(doc, Modality::Code, "codebert", vec![0.9]), // wrong dim
            ],
        )
        .await;

    assert!(matches!(result, Err(CoreError::Rejection(_))));
    // Nothing was committed.
    assert!(service.assignment(doc).await.unwrap().is_none());
    assert_eq!(
        service.state(doc).await.unwrap(),
        DocumentState::Unclassified
    );
}

#[tokio::test]
async fn embedding_for_wrong_document_is_rejected() {
    let service = service().await;
    let doc = Uuid::new_v4();

    let result = service
        .classify_and_commit(
            doc,
            vec![raw(Uuid::new_v4(), Modality::Text, "minilm", vec![1.0, 0.0])],
        )
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn feedback_requires_existing_assignment_revision() {
    let service = service().await;
    let doc = Uuid::new_v4();

    // No assignment exists yet: feedback must be rejected.
    let result = service
        .submit_feedback(FeedbackEvent::new(
            doc,
            "analyst",
            1,
            FeedbackVerdict::Confirmed,
        ))
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));

    service
        .classify_and_commit(doc, vec![raw(doc, Modality::Text, "minilm", vec![1.0, 0.0])])
        .await
        .unwrap();

    // Revision 1 now exists; revision 7 still does not.
    let seq = service
        .submit_feedback(FeedbackEvent::new(
            doc,
            "analyst",
            1,
            FeedbackVerdict::Confirmed,
        ))
        .await
        .unwrap();
    assert_eq!(seq, 1);

    let result = service
        .submit_feedback(FeedbackEvent::new(
            doc,
            "analyst",
            7,
            FeedbackVerdict::Confirmed,
        ))
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn lifecycle_walks_classified_disputed_reclassified() {
    let service = service().await;
    let doc = Uuid::new_v4();
    let embedding = || raw(doc, Modality::Text, "minilm", vec![1.0, 0.0]);

    service.classify_and_commit(doc, vec![embedding()]).await.unwrap();
    assert_eq!(service.state(doc).await.unwrap(), DocumentState::Classified);

    service
        .submit_feedback(FeedbackEvent::new(
            doc,
            "analyst",
            1,
            FeedbackVerdict::Corrected(vec![tid("T1566")]),
        ))
        .await
        .unwrap();
    assert_eq!(service.state(doc).await.unwrap(), DocumentState::Disputed);

    // Re-running classification after the dispute appends revision 2.
    let second = service.classify_and_commit(doc, vec![embedding()]).await.unwrap();
    assert_eq!(second.revision, 2);
    assert_eq!(
        service.state(doc).await.unwrap(),
        DocumentState::Reclassified
    );

    // Prior revisions stay queryable for audit.
    let history = service.history(doc).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].revision, 1);
}

#[tokio::test]
async fn manual_recalibration_swaps_the_snapshot() {
    let service = service().await;
    let doc = Uuid::new_v4();
    service
        .classify_and_commit(doc, vec![raw(doc, Modality::Text, "minilm", vec![1.0, 0.0])])
        .await
        .unwrap();
    service
        .submit_feedback(FeedbackEvent::new(
            doc,
            "analyst",
            1,
            FeedbackVerdict::Confirmed,
        ))
        .await
        .unwrap();

    let snapshot = service.recalibrate_now().await.unwrap();
    // One confirmation is below the supervised threshold, but the centroid
    // is already accumulating.
    assert_eq!(
        snapshot
            .centroids_for(Modality::Text)
            .unwrap()
            .get(&tid("T1059"))
            .unwrap()
            .confirmations,
        1
    );
}
