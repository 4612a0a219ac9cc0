//! Turning a finished session into one batch of graph changes.
//!
//! Only the latest record of each stage kind counts. Items are applied one by
//! one against a draft copy of the graph: an item that fails is logged and
//! skipped, and everything applied before and after it stays.

use super::StageRecord;
use super::payload::{
    AchievementsData, NewTask, NewTasksData, ProjectStatusData, RiskUpdate, RiskUpdatesData,
    StagePayload, SummaryData, TaskUpdate, TaskUpdatesData,
};
use crate::domain::{
    Entity, EntityType, KnowledgeGraph, ObservationAddition, PriorityValue, Relation, RelationType,
    StatusValue,
};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// What a finalization applied and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizationReport {
    /// Project the session belongs to, when it exists in the graph.
    pub project: Option<String>,
    /// Session summary text.
    pub summary: String,
    /// Achievement entities created.
    pub achievements: Vec<String>,
    /// Tasks whose status or notes changed.
    pub tasks_updated: Vec<String>,
    /// Tasks created.
    pub tasks_created: Vec<String>,
    /// New project status, when set.
    pub project_status: Option<String>,
    /// Risks created or updated.
    pub risks_updated: Vec<String>,
    /// One message per skipped item.
    pub skipped: Vec<String>,
}

impl FinalizationReport {
    /// Human-readable one-paragraph summary.
    #[must_use]
    pub fn describe(&self, session_id: &str) -> String {
        let mut parts = vec![
            format!("{} achievement(s) recorded", self.achievements.len()),
            format!("{} task(s) updated", self.tasks_updated.len()),
            format!("{} task(s) created", self.tasks_created.len()),
        ];
        if let Some(status) = &self.project_status {
            parts.push(format!("project status set to {status}"));
        }
        parts.push(format!("{} risk(s) updated", self.risks_updated.len()));
        if !self.skipped.is_empty() {
            parts.push(format!("{} item(s) skipped", self.skipped.len()));
        }

        let target = self
            .project
            .as_deref()
            .map_or_else(String::new, |p| format!(" for project {p}"));
        format!("Session {session_id} finalized{target}: {}.", parts.join(", "))
    }
}

/// Latest payload of each stage kind.
#[derive(Default)]
struct Collected<'a> {
    summary: Option<&'a SummaryData>,
    achievements: Option<&'a AchievementsData>,
    task_updates: Option<&'a TaskUpdatesData>,
    new_tasks: Option<&'a NewTasksData>,
    project_status: Option<&'a ProjectStatusData>,
    risk_updates: Option<&'a RiskUpdatesData>,
}

impl<'a> Collected<'a> {
    fn from_records(records: &'a [StageRecord]) -> Self {
        let mut collected = Self::default();
        for record in records {
            match &record.payload {
                StagePayload::Summary(d) => collected.summary = Some(d),
                StagePayload::Achievements(d) => collected.achievements = Some(d),
                StagePayload::TaskUpdates(d) => collected.task_updates = Some(d),
                StagePayload::NewTasks(d) => collected.new_tasks = Some(d),
                StagePayload::ProjectStatus(d) => collected.project_status = Some(d),
                StagePayload::RiskUpdates(d) => collected.risk_updates = Some(d),
                StagePayload::Assembly(_) | StagePayload::Complete => {}
            }
        }
        collected
    }
}

/// Apply `change` to a copy of `graph`, keeping the copy only on success.
fn attempt(
    graph: &mut KnowledgeGraph,
    report: &mut FinalizationReport,
    item: &str,
    change: impl FnOnce(&mut KnowledgeGraph) -> Result<()>,
) -> bool {
    let mut draft = graph.clone();
    match change(&mut draft) {
        Ok(()) => {
            *graph = draft;
            true
        }
        Err(e) => {
            warn!(item, error = %e, "Skipping session item");
            report.skipped.push(format!("{item}: {e}"));
            false
        }
    }
}

fn parse_status(text: &str) -> Result<StatusValue> {
    StatusValue::from_alias(text).ok_or_else(|| Error::InvalidStatus(text.to_string()))
}

struct Finalizer<'s> {
    session_id: &'s str,
    today: NaiveDate,
    project: Option<String>,
}

impl Finalizer<'_> {
    fn link_to_project(&self, graph: &mut KnowledgeGraph, name: &str) -> Result<()> {
        match &self.project {
            Some(project) => graph
                .create_relations(vec![Relation::new(name, project, RelationType::PartOf)])
                .map(drop),
            None => Ok(()),
        }
    }

    fn achievement(&self, graph: &mut KnowledgeGraph, text: &str) -> Result<()> {
        let name = format!("Achievement: {text}");
        graph.create_entities(vec![Entity::new(&name, EntityType::Note).with_observations([
            format!("Session: {}", self.session_id),
            format!("Date: {}", self.today),
        ])])?;
        self.link_to_project(graph, &name)
    }

    fn task_update(graph: &mut KnowledgeGraph, update: &TaskUpdate) -> Result<()> {
        if graph.entity_of_type(&update.name, EntityType::Task).is_none() {
            return Err(Error::TaskNotFound(update.name.clone()));
        }
        if let Some(status) = &update.status {
            graph.set_status(&update.name, parse_status(status)?)?;
        }
        if let Some(note) = &update.note {
            graph.add_observations(vec![ObservationAddition {
                entity_name: update.name.clone(),
                contents: vec![format!("Update: {note}")],
            }])?;
        }
        Ok(())
    }

    fn new_task(
        &self,
        graph: &mut KnowledgeGraph,
        task: &NewTask,
        previous: Option<&str>,
    ) -> Result<()> {
        let status = task
            .status
            .as_deref()
            .map_or(Ok(StatusValue::Pending), parse_status)?;

        let entity = Entity::new(&task.name, EntityType::Task).with_observations(
            task.description
                .iter()
                .map(|d| format!("Description: {d}")),
        );
        graph.create_entities(vec![entity])?;
        self.link_to_project(graph, &task.name)?;
        graph.set_status(&task.name, status)?;
        if let Some(priority) = task.priority.as_deref().and_then(PriorityValue::from_alias) {
            graph.set_priority(&task.name, priority)?;
        }

        let mut sequencing = Vec::new();
        if let Some(previous) = previous {
            sequencing.push(Relation::new(previous, &task.name, RelationType::Precedes));
        }
        if let Some(successor) = &task.precedes {
            sequencing.push(Relation::new(&task.name, successor, RelationType::Precedes));
        }
        graph.create_relations(sequencing).map(drop)
    }

    fn project_status(&self, graph: &mut KnowledgeGraph, data: &ProjectStatusData) -> Result<()> {
        let Some(project) = &self.project else {
            return Err(Error::ProjectNotFound("<none>".to_string()));
        };
        if let Some(status) = &data.project_status {
            graph.set_status(project, parse_status(status)?)?;
        }
        if let Some(text) = &data.project_observation {
            graph.add_observations(vec![ObservationAddition {
                entity_name: project.clone(),
                contents: vec![format!("Status update: {text}")],
            }])?;
        }
        Ok(())
    }

    fn risk_update(&self, graph: &mut KnowledgeGraph, risk: &RiskUpdate) -> Result<()> {
        if !graph.contains(&risk.name) {
            graph.create_entities(vec![Entity::new(&risk.name, EntityType::Risk)])?;
            self.link_to_project(graph, &risk.name)?;
        }
        let fields = [
            ("Description", &risk.description),
            ("Status", &risk.status),
            ("Likelihood", &risk.likelihood),
            ("Impact", &risk.impact),
            ("Mitigation", &risk.mitigation),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                graph.replace_field(&risk.name, key, value)?;
            }
        }
        Ok(())
    }
}

/// Apply the latest stage payloads of a session to `graph`.
pub fn apply_session(
    graph: &mut KnowledgeGraph,
    session_id: &str,
    records: &[StageRecord],
    today: NaiveDate,
) -> FinalizationReport {
    let stages = Collected::from_records(records);
    let mut report = FinalizationReport {
        summary: stages.summary.map(|s| s.summary.clone()).unwrap_or_default(),
        ..FinalizationReport::default()
    };

    let named_project = stages.summary.and_then(|s| s.project.clone());
    let project = named_project
        .clone()
        .filter(|p| graph.entity_of_type(p, EntityType::Project).is_some());
    if let (Some(name), None) = (&named_project, &project) {
        warn!(session_id, project = %name, "Session project not found, items will not be linked");
    }
    report.project.clone_from(&project);
    let finalizer = Finalizer {
        session_id,
        today,
        project,
    };

    for text in stages.achievements.map(|a| a.achievements.as_slice()).unwrap_or_default() {
        let name = format!("Achievement: {text}");
        if graph.contains(&name) {
            continue;
        }
        if attempt(graph, &mut report, &name, |g| finalizer.achievement(g, text)) {
            report.achievements.push(name);
        }
    }

    for update in stages.task_updates.map(|t| t.updates.as_slice()).unwrap_or_default() {
        if attempt(graph, &mut report, &update.name, |g| Finalizer::task_update(g, update)) {
            report.tasks_updated.push(update.name.clone());
        }
    }

    if let Some(data) = stages.new_tasks {
        let mut previous: Option<String> = None;
        for task in &data.new_tasks {
            let chain = if data.sequential { previous.as_deref() } else { None };
            if attempt(graph, &mut report, &task.name, |g| finalizer.new_task(g, task, chain)) {
                report.tasks_created.push(task.name.clone());
                previous = Some(task.name.clone());
            }
        }
    }

    if let Some(data) = stages.project_status
        && attempt(graph, &mut report, "project status", |g| finalizer.project_status(g, data))
    {
        report.project_status = data
            .project_status
            .as_deref()
            .and_then(StatusValue::from_alias)
            .map(|s| s.to_string());
    }

    for risk in stages.risk_updates.map(|r| r.risk_updates.as_slice()).unwrap_or_default() {
        if attempt(graph, &mut report, &risk.name, |g| finalizer.risk_update(g, risk)) {
            report.risks_updated.push(risk.name.clone());
        }
    }

    info!(
        session_id,
        achievements = report.achievements.len(),
        tasks_updated = report.tasks_updated.len(),
        tasks_created = report.tasks_created.len(),
        risks_updated = report.risks_updated.len(),
        skipped = report.skipped.len(),
        "Applied session to graph"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StatusIndex;

    fn record(n: usize, payload: StagePayload) -> StageRecord {
        StageRecord {
            stage_number: n,
            analysis: String::new(),
            completed: false,
            payload,
        }
    }

    fn summary(project: &str) -> StagePayload {
        StagePayload::Summary(SummaryData {
            summary: "weekly sync".into(),
            project: Some(project.into()),
            duration: None,
        })
    }

    fn base() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![
                Entity::new("P1", EntityType::Project),
                Entity::new("T1", EntityType::Task),
            ],
            relations: vec![Relation::new("T1", "P1", RelationType::PartOf)],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[test]
    fn latest_record_of_a_stage_wins() {
        let records = vec![
            record(1, summary("P1")),
            record(2, StagePayload::Achievements(AchievementsData {
                achievements: vec!["old".into()],
            })),
            record(3, StagePayload::Achievements(AchievementsData {
                achievements: vec!["new".into()],
            })),
        ];
        let mut graph = base();
        let report = apply_session(&mut graph, "s1", &records, today());

        assert_eq!(report.achievements, ["Achievement: new"]);
        let note = graph.entity("Achievement: new").unwrap();
        assert!(note.observations.contains(&"Date: 2025-05-01".to_string()));
        assert!(graph.has_relation("Achievement: new", "P1", RelationType::PartOf));
        assert!(!graph.contains("Achievement: old"));
    }

    #[test]
    fn failing_items_are_skipped_and_rest_applies() {
        let records = vec![
            record(1, summary("P1")),
            record(2, StagePayload::TaskUpdates(TaskUpdatesData {
                updates: vec![
                    TaskUpdate { name: "Ghost".into(), status: Some("done".into()), note: None },
                    TaskUpdate { name: "T1".into(), status: Some("finished".into()), note: None },
                    TaskUpdate { name: "T1".into(), status: Some("whenever".into()), note: None },
                ],
            })),
        ];
        let mut graph = base();
        let report = apply_session(&mut graph, "s1", &records, today());

        assert_eq!(report.tasks_updated, ["T1"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(StatusIndex::build(&graph).status("T1"), Some("completed"));
    }

    #[test]
    fn sequential_new_tasks_are_chained() {
        let records = vec![
            record(1, summary("P1")),
            record(2, StagePayload::NewTasks(NewTasksData {
                new_tasks: vec![
                    NewTask { name: "A".into(), priority: Some("urgent".into()), ..NewTask::default() },
                    NewTask { name: "T1".into(), ..NewTask::default() },
                    NewTask { name: "B".into(), precedes: Some("T1".into()), ..NewTask::default() },
                ],
                sequential: true,
            })),
        ];
        let mut graph = base();
        let report = apply_session(&mut graph, "s1", &records, today());

        assert_eq!(report.tasks_created, ["A", "B"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(graph.has_relation("A", "B", RelationType::Precedes));
        assert!(graph.has_relation("B", "T1", RelationType::Precedes));
        let index = StatusIndex::build(&graph);
        assert_eq!(index.status("A"), Some("pending"));
        assert_eq!(index.priority("A"), Some("high"));
        assert_eq!(index.priority("B"), None);
    }

    #[test]
    fn failed_new_task_leaves_no_trace() {
        let records = vec![
            record(1, summary("P1")),
            record(2, StagePayload::NewTasks(NewTasksData {
                new_tasks: vec![NewTask {
                    name: "C".into(),
                    precedes: Some("Missing".into()),
                    ..NewTask::default()
                }],
                sequential: false,
            })),
        ];
        let mut graph = base();
        let before = graph.clone();
        let report = apply_session(&mut graph, "s1", &records, today());

        assert!(report.tasks_created.is_empty());
        assert_eq!(graph, before);
    }

    #[test]
    fn risks_are_created_then_updated() {
        let mut graph = base();
        let risk = |status: &str, impact: Option<&str>| {
            record(2, StagePayload::RiskUpdates(RiskUpdatesData {
                risk_updates: vec![RiskUpdate {
                    name: "Vendor".into(),
                    status: Some(status.into()),
                    impact: impact.map(Into::into),
                    ..RiskUpdate::default()
                }],
            }))
        };

        apply_session(&mut graph, "s1", &[record(1, summary("P1")), risk("open", Some("4"))], today());
        apply_session(&mut graph, "s2", &[record(1, summary("P1")), risk("mitigated", None)], today());

        let vendor = graph.entity("Vendor").unwrap();
        assert_eq!(vendor.entity_type, EntityType::Risk);
        assert_eq!(vendor.observations, ["Impact: 4", "Status: mitigated"]);
        assert!(graph.has_relation("Vendor", "P1", RelationType::PartOf));
    }

    #[test]
    fn project_status_sets_relation_and_observation() {
        let records = vec![
            record(1, summary("P1")),
            record(2, StagePayload::ProjectStatus(ProjectStatusData {
                project_status: Some("in progress".into()),
                project_observation: Some("on track".into()),
            })),
        ];
        let mut graph = base();
        let report = apply_session(&mut graph, "s1", &records, today());

        assert_eq!(report.project_status.as_deref(), Some("active"));
        assert_eq!(StatusIndex::build(&graph).status("P1"), Some("active"));
        assert_eq!(graph.entity("P1").unwrap().observations, ["Status update: on track"]);
        assert!(report.describe("s1").contains("project status set to active"));
    }
}
