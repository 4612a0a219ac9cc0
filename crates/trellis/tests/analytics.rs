//! End-to-end analytics over a small project graph.

mod common;

use common::{apollo, empty_store, entity, rel, store_with};
use trellis::analytics::{ConnectionType, EventKind, HealthCategory};
use trellis::domain::{EntityType, KnowledgeGraph, RelationType};
use trellis::error::{Error, ErrorKind};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn overview_completion_rate_is_half() {
    let (store, _) = empty_store();
    store
        .create_entities(vec![
            entity("P1", EntityType::Project, &[]),
            entity("T1", EntityType::Task, &[]),
            entity("T2", EntityType::Task, &[]),
        ])
        .await
        .unwrap();
    store
        .create_relations(vec![
            rel("T1", "P1", RelationType::PartOf),
            rel("T2", "P1", RelationType::PartOf),
        ])
        .await
        .unwrap();
    store.set_entity_status("T1", "completed").await.unwrap();
    store.add_observations(vec![trellis::domain::ObservationAddition {
        entity_name: "T2".into(),
        contents: vec!["Status: not_started".into()],
    }])
    .await
    .unwrap();

    let overview = store.get_project_overview("P1").await.unwrap();

    assert_eq!(overview.summary.task_count, 2);
    assert_eq!(overview.summary.completed_tasks, 1);
    assert_close(overview.summary.task_completion_rate, 50.0);
    assert_eq!(overview.tasks_by_status["completed"].len(), 1);
    assert_eq!(overview.tasks_by_status["not_started"].len(), 1);
}

#[tokio::test]
async fn overview_collects_project_parts() {
    let (store, _) = store_with(apollo());

    let overview = store.get_project_overview("Apollo").await.unwrap();

    assert_eq!(overview.summary.task_count, 3);
    assert_eq!(overview.summary.team_size, 1);
    assert_eq!(overview.summary.risk_count, 1);
    assert_eq!(overview.summary.resource_count, 1);
    assert_eq!(overview.summary.upcoming_milestone_count, 1);
    assert_eq!(overview.upcoming_milestones[0].name, "Beta");
}

#[tokio::test]
async fn unknown_project_is_not_found_everywhere() {
    let (store, _) = store_with(apollo());

    let errors = [
        store.get_project_overview("Gemini").await.unwrap_err(),
        store.get_milestone_progress("Gemini").await.unwrap_err(),
        store.get_project_timeline("Gemini").await.unwrap_err(),
        store.get_resource_allocation("Gemini").await.unwrap_err(),
        store.get_project_risks("Gemini").await.unwrap_err(),
        store.find_related_projects("Gemini", None).await.unwrap_err(),
        store.get_decision_log("Gemini").await.unwrap_err(),
        store.get_project_health("Gemini").await.unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, Error::ProjectNotFound(ref p) if p == "Gemini"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

#[tokio::test]
async fn a_task_is_not_a_project() {
    let (store, _) = store_with(apollo());
    let err = store.get_project_overview("Design").await.unwrap_err();
    assert!(matches!(err, Error::ProjectNotFound(_)));
}

#[tokio::test]
async fn dependency_chain_and_critical_path() {
    let (store, _) = store_with(apollo());

    let deps = store.get_task_dependencies("Launch", None).await.unwrap();

    assert_eq!(deps.depth, 2);
    let names: Vec<&str> = deps.dependencies.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Launch", "Build", "Design"]);
    assert_eq!(deps.critical_path, vec!["Design", "Build", "Launch"]);

    let build = &deps.dependencies[1];
    assert_eq!(build.level, 1);
    assert_eq!(build.assignee.as_deref(), Some("Ada"));
    assert_eq!(build.depends_on, vec!["Design"]);
    assert_eq!(build.depended_on_by, vec!["Launch"]);
}

#[tokio::test]
async fn dependency_depth_limits_expansion() {
    let (store, _) = store_with(apollo());

    let deps = store.get_task_dependencies("Launch", Some(1)).await.unwrap();

    let names: Vec<&str> = deps.dependencies.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Launch", "Build"]);
}

#[tokio::test]
async fn cyclic_dependencies_terminate() {
    let graph = KnowledgeGraph {
        entities: vec![
            entity("A", EntityType::Task, &[]),
            entity("B", EntityType::Task, &[]),
        ],
        relations: vec![
            rel("A", "B", RelationType::DependsOn),
            rel("B", "A", RelationType::DependsOn),
        ],
    };
    let (store, _) = store_with(graph);

    let deps = store.get_task_dependencies("A", Some(5)).await.unwrap();

    let a = deps.dependencies.iter().find(|n| n.name == "A").unwrap();
    let b = deps.dependencies.iter().find(|n| n.name == "B").unwrap();
    assert!(a.depends_on.contains(&"B".to_string()));
    assert!(b.depends_on.contains(&"A".to_string()));
}

#[tokio::test]
async fn team_member_assignments() {
    let (store, _) = store_with(apollo());

    let team = store.get_team_member_assignments("Ada").await.unwrap();

    assert_eq!(team.task_count, 1);
    assert_eq!(team.completed_count, 0);
    assert_eq!(team.upcoming.len(), 1);
    assert_eq!(team.upcoming[0].name, "Build");
    assert!(team.overdue.is_empty());
    assert_eq!(team.by_project["Apollo"]["active"][0].name, "Build");

    let err = store.get_team_member_assignments("Grace").await.unwrap_err();
    assert!(matches!(err, Error::TeamMemberNotFound(_)));
}

#[tokio::test]
async fn milestone_progress_counts_required_tasks() {
    let (store, _) = store_with(apollo());

    let report = store.get_milestone_progress("Apollo").await.unwrap();

    let beta = &report.milestones[0];
    assert_eq!(beta.name, "Beta");
    assert_eq!(beta.tasks, vec!["Build"]);
    assert_eq!(beta.days_remaining, Some(4));
    assert!(!beta.overdue);
    assert_close(beta.completion_percentage, 0.0);
}

#[tokio::test]
async fn timeline_orders_events_and_tracks_position() {
    let (store, _) = store_with(apollo());

    let timeline = store.get_project_timeline("Apollo").await.unwrap();

    let kinds: Vec<EventKind> = timeline.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ProjectStart,
            EventKind::TaskDue,
            EventKind::Milestone,
            EventKind::ProjectEnd
        ]
    );
    assert_eq!(timeline.total_days, Some(30));
    assert_eq!(timeline.current_position, Some(1));
    assert_eq!(timeline.events[1].days_from_previous, Some(11));
    assert_eq!(timeline.events[1].days_to_next, Some(2));
    assert_close(timeline.progress_percentage, 30.0);
}

#[tokio::test]
async fn resource_usage_against_capacity() {
    let (store, _) = store_with(apollo());

    let allocation = store.get_resource_allocation("Apollo").await.unwrap();

    let rig = &allocation.resources[0];
    assert_eq!(rig.tasks, vec!["Build"]);
    assert_eq!(rig.active_tasks, 1);
    assert_eq!(rig.members, vec!["Ada"]);
    assert_close(rig.usage_percentage, 50.0);
    assert!(allocation.overallocated.is_empty());
    assert!(allocation.underutilized.is_empty());
}

#[tokio::test]
async fn risks_are_scored_and_flagged() {
    let (store, _) = store_with(apollo());

    let report = store.get_project_risks("Apollo").await.unwrap();

    let risk = &report.risks[0];
    assert_eq!(risk.score, Some(20));
    assert!(risk.high_priority);
    assert_eq!(risk.affected, vec!["Build"]);
    assert_eq!(report.high_priority, vec!["Supplier delay"]);
}

#[tokio::test]
async fn decisions_list_linked_entities() {
    let (store, _) = store_with(apollo());

    let log = store.get_decision_log("Apollo").await.unwrap();

    assert_eq!(log.decisions.len(), 1);
    assert_eq!(log.decisions[0].name, "Use titanium");
    assert_eq!(log.decisions[0].linked, vec!["Design"]);
}

#[tokio::test]
async fn projects_sharing_a_member_are_related() {
    let mut graph = apollo();
    graph
        .entities
        .push(entity("Gemini", EntityType::Project, &[]));
    graph
        .relations
        .push(rel("Ada", "Gemini", RelationType::Manages));
    let (store, _) = store_with(graph);

    let related = store.find_related_projects("Apollo", None).await.unwrap();

    assert_eq!(related.related.len(), 1);
    let gemini = &related.related[0];
    assert_eq!(gemini.name, "Gemini");
    assert_eq!(gemini.connection_type, ConnectionType::SharedTeam);
    assert_eq!(gemini.shared_team, vec!["Ada"]);
    assert_close(gemini.strength, 2.0);
}

#[tokio::test]
async fn empty_project_health_is_neutral() {
    let (store, _) = store_with(KnowledgeGraph {
        entities: vec![entity("Empty", EntityType::Project, &[])],
        relations: vec![],
    });

    let first = store.get_project_health("Empty").await.unwrap();
    let second = store.get_project_health("Empty").await.unwrap();

    assert_close(first.factors.task_completion, 50.0);
    assert_close(first.factors.milestone_completion, 50.0);
    assert_close(first.factors.issue_resolution, 50.0);
    assert_close(first.factors.risk_mitigation, 50.0);
    assert_close(first.score, 50.0);
    assert_close(first.score, second.score);
}

#[tokio::test]
async fn health_reflects_active_risks() {
    let (store, _) = store_with(apollo());

    let health = store.get_project_health("Apollo").await.unwrap();

    assert_eq!(health.metrics.active_risks, 1);
    assert!(!health.metrics.schedule_slip);
    assert_close(health.factors.unblocked_tasks, 100.0);
    assert_ne!(health.category, HealthCategory::Healthy);
    assert!(
        health
            .recommendations
            .iter()
            .any(|r| r.contains("mitigation plans"))
    );
}
