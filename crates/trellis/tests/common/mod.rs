//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use trellis::domain::{Entity, EntityType, KnowledgeGraph, Relation, RelationType};
use trellis::{FixedClock, GraphStore, InMemoryGraphBackend};

/// Fixed "today" used by date-relative tests.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// A store over an empty in-memory graph with a fixed clock.
pub fn empty_store() -> (GraphStore, InMemoryGraphBackend) {
    let backend = InMemoryGraphBackend::new();
    let store = GraphStore::new(backend.clone()).with_clock(FixedClock(today()));
    (store, backend)
}

/// A store over `graph` with a fixed clock.
pub fn store_with(graph: KnowledgeGraph) -> (GraphStore, InMemoryGraphBackend) {
    let backend = InMemoryGraphBackend::with_graph(graph);
    let store = GraphStore::new(backend.clone()).with_clock(FixedClock(today()));
    (store, backend)
}

pub fn entity(name: &str, entity_type: EntityType, observations: &[&str]) -> Entity {
    Entity::new(name, entity_type).with_observations(observations.iter().copied())
}

pub fn rel(from: &str, to: &str, relation_type: RelationType) -> Relation {
    Relation::new(from, to, relation_type)
}

/// A small project "Apollo" with three tasks, a milestone, a member, a
/// resource, a risk and a decision.
///
/// - `Design` (completed) <- `Build` (active, due 2025-03-12) <- `Launch` (pending)
/// - `Build` is assigned to `Ada`, who manages `Rig`
/// - `Beta` milestone on 2025-03-14 requires `Build`
/// - `Build` is impacted by `Supplier delay`; `Design` by `Use titanium`
pub fn apollo() -> KnowledgeGraph {
    KnowledgeGraph {
        entities: vec![
            entity(
                "Apollo",
                EntityType::Project,
                &[
                    "Description: lunar lander",
                    "StartDate: 2025-03-01",
                    "EndDate: 2025-03-31",
                ],
            ),
            entity("Design", EntityType::Task, &["Status: completed"]),
            entity(
                "Build",
                EntityType::Task,
                &["Status: active", "DueDate: 2025-03-12"],
            ),
            entity("Launch", EntityType::Task, &["Status: pending"]),
            entity("Beta", EntityType::Milestone, &["Date: 2025-03-14"]),
            entity("Ada", EntityType::TeamMember, &["Role: engineer"]),
            entity("Rig", EntityType::Resource, &["Capacity: 2"]),
            entity(
                "Supplier delay",
                EntityType::Risk,
                &["Likelihood: 4", "Impact: 5", "Status: open"],
            ),
            entity("Use titanium", EntityType::Decision, &["Date: 2025-03-02"]),
        ],
        relations: vec![
            rel("Design", "Apollo", RelationType::PartOf),
            rel("Build", "Apollo", RelationType::PartOf),
            rel("Launch", "Apollo", RelationType::PartOf),
            rel("Beta", "Apollo", RelationType::PartOf),
            rel("Rig", "Apollo", RelationType::PartOf),
            rel("Supplier delay", "Apollo", RelationType::PartOf),
            rel("Use titanium", "Apollo", RelationType::PartOf),
            rel("Ada", "Apollo", RelationType::ContributesTo),
            rel("Build", "Design", RelationType::DependsOn),
            rel("Launch", "Build", RelationType::DependsOn),
            rel("Build", "Ada", RelationType::AssignedTo),
            rel("Build", "Rig", RelationType::DependsOn),
            rel("Ada", "Rig", RelationType::Manages),
            rel("Build", "Beta", RelationType::RequiredFor),
            rel("Build", "Supplier delay", RelationType::ImpactedBy),
            rel("Design", "Use titanium", RelationType::ImpactedBy),
        ],
    }
}

/// Get the workspace root directory
pub fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Build the binary once and return its path
pub fn get_trellis_binary() -> PathBuf {
    let workspace = workspace_root();

    let status = Command::new("cargo")
        .args(["build", "--package", "trellis", "--quiet"])
        .current_dir(&workspace)
        .status()
        .expect("Failed to build trellis");

    assert!(status.success(), "Failed to build trellis binary");

    workspace.join("target/debug/trellis")
}

/// Run the trellis binary in the specified directory
pub fn run_trellis_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_trellis_binary())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute trellis binary")
}
