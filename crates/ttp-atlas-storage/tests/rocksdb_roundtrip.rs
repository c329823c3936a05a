//! RocksDB round-trip tests: the persisted stores honor the same
//! contracts as the in-memory ones, across process restarts.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use ttp_atlas_core::error::CoreError;
use ttp_atlas_core::traits::{AssignmentStore, FeedbackLedger, TaxonomyStore};
use ttp_atlas_core::types::{
    Assignment, CommittedTechnique, FeedbackEvent, FeedbackVerdict, Tactic, TaxonomyVersion,
    Technique, TechniqueId,
};
use ttp_atlas_storage::RocksDbAtlasStore;

fn tid(raw: &str) -> TechniqueId {
    TechniqueId::new(raw).unwrap()
}

fn technique(id: &str) -> Technique {
    Technique {
        id: tid(id),
        name: format!("Technique {id}"),
        description: format!("Description of {id}."),
        tactics: vec![Tactic::Execution, Tactic::DefenseEvasion],
        deprecated: false,
        superseded_by: None,
    }
}

fn assignment(document_id: Uuid, revision: u32, seq: u64) -> Assignment {
    Assignment {
        document_id,
        revision,
        techniques: vec![CommittedTechnique {
            technique_id: tid("T1059"),
            confidence: 0.8,
            provenance: None,
        }],
        taxonomy_version: TaxonomyVersion::FIRST,
        aggregate_confidence: 0.8,
        decided_at: Utc::now() + Duration::milliseconds(seq as i64),
        decision_seq: seq,
        provenance: vec![],
    }
}

#[tokio::test]
async fn taxonomy_versions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let successor_id = tid("T1566");

    {
        let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
        TaxonomyStore::publish(&store, vec![technique("T1059")])
            .await
            .unwrap();
        let mut deprecated = technique("T1059");
        deprecated.deprecated = true;
        deprecated.superseded_by = Some(tid("T1566"));
        TaxonomyStore::publish(&store, vec![deprecated, technique("T1566")])
            .await
            .unwrap();
    }

    let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
    assert_eq!(
        TaxonomyStore::latest(&store).await.unwrap(),
        Some(TaxonomyVersion(2))
    );

    // v1 is still exactly what was published: no T1566, no deprecation.
    let v1 = store.snapshot(TaxonomyVersion(1)).await.unwrap();
    assert_eq!(v1.len(), 1);
    assert!(!v1.contains(&successor_id));
    let old = store.resolve(&tid("T1059"), TaxonomyVersion(1)).await.unwrap();
    assert!(!old.deprecated);

    // v2 carries the deprecation and successor.
    let new = store.resolve(&tid("T1059"), TaxonomyVersion(2)).await.unwrap();
    assert!(new.deprecated);
    assert_eq!(new.superseded_by.unwrap(), successor_id);
}

#[tokio::test]
async fn publish_validation_rejects_without_writing() {
    let dir = TempDir::new().unwrap();
    let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();

    let mut dangling = technique("T1059");
    dangling.deprecated = true;
    dangling.superseded_by = Some(tid("T9999"));
    let result = TaxonomyStore::publish(&store, vec![dangling]).await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
    assert_eq!(TaxonomyStore::latest(&store).await.unwrap(), None);
}

#[tokio::test]
async fn assignment_history_survives_reopen_in_order() {
    let dir = TempDir::new().unwrap();
    let doc = Uuid::new_v4();

    {
        let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
        for (revision, seq) in [(1u32, 10u64), (2, 11), (3, 12)] {
            store.append(assignment(doc, revision, seq)).await.unwrap();
        }
        // Conflicting revision is rejected and not persisted.
        let conflict = store.append(assignment(doc, 3, 13)).await;
        assert!(matches!(conflict, Err(CoreError::RevisionConflict { .. })));
    }

    let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
    let history = AssignmentStore::history(&store, doc).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].revision < w[1].revision));
    assert_eq!(
        AssignmentStore::latest(&store, doc).await.unwrap().unwrap().revision,
        3
    );
    assert_eq!(store.last_decision_seq().await.unwrap(), 12);
}

#[tokio::test]
async fn assignments_are_isolated_per_document() {
    let dir = TempDir::new().unwrap();
    let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
    let doc_a = Uuid::new_v4();
    let doc_b = Uuid::new_v4();

    store.append(assignment(doc_a, 1, 1)).await.unwrap();
    store.append(assignment(doc_b, 1, 2)).await.unwrap();
    store.append(assignment(doc_b, 2, 3)).await.unwrap();

    assert_eq!(AssignmentStore::history(&store, doc_a).await.unwrap().len(), 1);
    assert_eq!(AssignmentStore::history(&store, doc_b).await.unwrap().len(), 2);
}

#[tokio::test]
async fn feedback_sequence_and_order_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let doc = Uuid::new_v4();
    let t0 = Utc::now();

    {
        let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
        for reviewer in ["a", "b"] {
            store
                .record(FeedbackEvent::new(
                    doc,
                    reviewer,
                    1,
                    FeedbackVerdict::Confirmed,
                ))
                .await
                .unwrap();
        }
    }

    let store = RocksDbAtlasStore::open(dir.path(), 8).unwrap();
    // Sequence resumes after the persisted events, not from 1.
    let seq = store
        .record(FeedbackEvent::new(
            doc,
            "c",
            1,
            FeedbackVerdict::Corrected(vec![tid("T1566")]),
        ))
        .await
        .unwrap();
    assert_eq!(seq, 3);

    let events = store.events_for(doc).await.unwrap();
    let reviewers: Vec<&str> = events.iter().map(|e| e.reviewer.as_str()).collect();
    assert_eq!(reviewers, vec!["a", "b", "c"]);

    let since = store.events_since(t0 - Duration::seconds(1)).await.unwrap();
    assert_eq!(since.len(), 3);
    assert!(since.windows(2).all(|w| (w[0].recorded_at, w[0].seq) <= (w[1].recorded_at, w[1].seq)));
}
