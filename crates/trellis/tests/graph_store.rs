//! Integration tests for the graph store over both backends.
//!
//! Covers persistence round trips, whole-batch rejection, cascade deletes
//! and status replacement.

mod common;

use common::{apollo, empty_store, entity, rel, store_with};
use proptest::prelude::*;
use std::collections::HashSet;
use tempfile::tempdir;
use trellis::domain::{EntityType, ObservationAddition, RelationType};
use trellis::error::{Error, ErrorKind};
use trellis::storage::GraphBackend;
use trellis::{GraphStore, JsonlGraphBackend};

// ========== Persistence ==========

#[tokio::test]
async fn created_entity_survives_reload_from_disk() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("graph.jsonl");

    let store = GraphStore::new(JsonlGraphBackend::new(&path));
    store
        .create_entities(vec![entity("Apollo", EntityType::Project, &["Goals: land"])])
        .await
        .unwrap();
    store
        .create_entities(vec![entity("Design", EntityType::Task, &[])])
        .await
        .unwrap();
    store
        .create_relations(vec![rel("Design", "Apollo", RelationType::PartOf)])
        .await
        .unwrap();

    let reloaded = JsonlGraphBackend::new(&path).load().await.unwrap();
    assert_eq!(reloaded.entities.len(), 2);
    assert_eq!(reloaded.relations.len(), 1);
    assert_eq!(
        reloaded.entity("Apollo").unwrap().observations,
        vec!["Goals: land".to_string()]
    );
}

#[tokio::test]
async fn missing_graph_file_reads_as_empty() {
    let temp = tempdir().unwrap();
    let store = GraphStore::new(JsonlGraphBackend::new(temp.path().join("absent.jsonl")));

    let graph = store.read_graph().await;
    assert!(graph.entities.is_empty());
    assert!(graph.relations.is_empty());
}

#[tokio::test]
async fn garbage_graph_file_reads_as_empty() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("graph.jsonl");
    tokio::fs::write(&path, "this is not json\n{also not\n").await.unwrap();

    let store = GraphStore::new(JsonlGraphBackend::new(&path));
    assert!(store.read_graph().await.entities.is_empty());
}

// ========== Conflicts and whole-batch rejection ==========

#[tokio::test]
async fn duplicate_entity_fails_and_leaves_graph_unchanged() {
    let (store, backend) = empty_store();
    store
        .create_entities(vec![entity("P1", EntityType::Project, &["Description: first"])])
        .await
        .unwrap();

    let err = store
        .create_entities(vec![
            entity("P2", EntityType::Project, &[]),
            entity("P1", EntityType::Project, &["Description: second"]),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateEntity(ref name) if name == "P1"));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let graph = backend.snapshot().await;
    assert_eq!(graph.entities.len(), 1);
    assert_eq!(
        graph.entity("P1").unwrap().observations,
        vec!["Description: first".to_string()]
    );
}

#[tokio::test]
async fn relation_to_missing_entity_rejects_whole_batch() {
    let (store, backend) = empty_store();
    store
        .create_entities(vec![
            entity("P1", EntityType::Project, &[]),
            entity("T1", EntityType::Task, &[]),
        ])
        .await
        .unwrap();

    let err = store
        .create_relations(vec![
            rel("T1", "P1", RelationType::PartOf),
            rel("T1", "Ghost", RelationType::DependsOn),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownEntity { ref name } if name == "Ghost"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(backend.snapshot().await.relations.is_empty());
}

#[tokio::test]
async fn duplicate_relation_triple_is_a_conflict() {
    let (store, _) = store_with(apollo());

    let err = store
        .create_relations(vec![rel("Design", "Apollo", RelationType::PartOf)])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn observations_on_missing_entity_add_nothing() {
    let (store, backend) = store_with(apollo());

    let err = store
        .add_observations(vec![
            ObservationAddition {
                entity_name: "Design".into(),
                contents: vec!["Effort: 3d".into()],
            },
            ObservationAddition {
                entity_name: "Nope".into(),
                contents: vec!["x".into()],
            },
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EntityNotFound(_)));
    let design = backend.snapshot().await.entity("Design").cloned().unwrap();
    assert!(!design.observations.iter().any(|o| o == "Effort: 3d"));
}

// ========== Deletion ==========

#[tokio::test]
async fn deleting_entity_cascades_only_its_relations() {
    let (store, backend) = store_with(apollo());

    store.delete_entities(&["Build".to_string()]).await.unwrap();

    let graph = backend.snapshot().await;
    assert!(graph.entity("Build").is_none());
    assert!(!graph.relations.iter().any(|r| r.from == "Build" || r.to == "Build"));
    // Neighbours and their unrelated relations survive.
    assert!(graph.entity("Design").is_some());
    assert!(graph.has_relation("Design", "Apollo", RelationType::PartOf));
    assert!(graph.has_relation("Ada", "Rig", RelationType::Manages));
}

// ========== Status side-table ==========

#[tokio::test]
async fn status_is_replaced_not_accumulated() {
    let (store, backend) = store_with(apollo());

    store.set_entity_status("Launch", "active").await.unwrap();
    store.set_entity_status("Launch", "completed").await.unwrap();

    assert_eq!(
        store.get_entity_status("Launch").await.as_deref(),
        Some("completed")
    );
    let graph = backend.snapshot().await;
    let count = graph
        .relations
        .iter()
        .filter(|r| r.from == "Launch" && r.relation_type == RelationType::HasStatus)
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn invalid_status_is_rejected_before_mutation() {
    let (store, backend) = store_with(apollo());
    let before = backend.snapshot().await;

    let err = store.set_entity_status("Launch", "someday").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.snapshot().await, before);
}

#[tokio::test]
async fn priority_is_replaced_not_accumulated() {
    let (store, backend) = store_with(apollo());

    store.set_entity_priority("Launch", "low").await.unwrap();
    store.set_entity_priority("Launch", "high").await.unwrap();

    assert_eq!(
        store.get_entity_priority("Launch").await.as_deref(),
        Some("high")
    );
    let graph = backend.snapshot().await;
    let targets: Vec<_> = graph
        .relations
        .iter()
        .filter(|r| r.from == "Launch" && r.relation_type == RelationType::HasPriority)
        .map(|r| r.to.as_str())
        .collect();
    assert_eq!(targets, ["priority:high"]);
}

#[tokio::test]
async fn invalid_priority_is_rejected_before_mutation() {
    let (store, backend) = store_with(apollo());
    let before = backend.snapshot().await;

    let err = store
        .set_entity_priority("Launch", "whenever")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPriority(ref v) if v == "whenever"));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.snapshot().await, before);
}

#[tokio::test]
async fn initializing_attribute_entities_is_idempotent() {
    let (store, backend) = store_with(apollo());

    let created = store.initialize_status_and_priority().await.unwrap();
    let again = store.initialize_status_and_priority().await.unwrap();

    let graph = backend.snapshot().await;
    let statuses = graph.entities_of_type(EntityType::Status).count();
    let priorities = graph.entities_of_type(EntityType::Priority).count();
    assert_eq!(statuses, 5);
    assert_eq!(priorities, 2);
    assert_eq!(created, statuses + priorities);
    assert_eq!(again, 0);
    assert!(graph.entity("status:blocked").is_some());
}

#[tokio::test]
async fn deleting_relations_matches_the_whole_triple() {
    let (store, backend) = store_with(apollo());
    store
        .create_relations(vec![rel("Build", "Design", RelationType::RelatedTo)])
        .await
        .unwrap();

    store
        .delete_relations(&[
            rel("Build", "Design", RelationType::DependsOn),
            rel("Design", "Build", RelationType::RelatedTo),
            rel("Ghost", "Build", RelationType::Blocks),
        ])
        .await
        .unwrap();

    let graph = backend.snapshot().await;
    assert!(!graph.has_relation("Build", "Design", RelationType::DependsOn));
    assert!(graph.has_relation("Build", "Design", RelationType::RelatedTo));
    assert!(graph.entity("Build").is_some());
    assert!(graph.entity("Design").is_some());
}

#[tokio::test]
async fn search_and_open_return_consistent_subgraphs() {
    let (store, _) = store_with(apollo());

    let found = store.search_nodes("titanium").await;
    assert_eq!(found.entities.len(), 1);
    assert!(found.relations.is_empty());

    let opened = store
        .open_nodes(&["Build".to_string(), "Design".to_string()])
        .await;
    assert_eq!(opened.entities.len(), 2);
    assert_eq!(opened.relations.len(), 1);
    assert!(opened.has_relation("Build", "Design", RelationType::DependsOn));
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn each_created_name_persists_exactly_once(
        names in prop::collection::vec("[A-Za-z][A-Za-z0-9_-]{0,12}", 1..12)
    ) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("graph.jsonl");

        tokio_test::block_on(async {
            let store = GraphStore::new(JsonlGraphBackend::new(&path));
            let mut seen = HashSet::new();
            for name in &names {
                let result = store
                    .create_entities(vec![entity(name, EntityType::Note, &[])])
                    .await;
                if seen.insert(name.clone()) {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert!(matches!(result, Err(Error::DuplicateEntity(_))));
                }
            }

            let graph = JsonlGraphBackend::new(&path).load().await.unwrap();
            prop_assert_eq!(graph.entities.len(), seen.len());
            for name in &seen {
                let count = graph.entities.iter().filter(|e| &e.name == name).count();
                prop_assert_eq!(count, 1);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
