//! Consolidated view of one project.

use super::{GraphStore, StatusIndex};
use crate::domain::fields::{MilestoneFields, ProjectFields, cmp_dates_undated_last};
use crate::domain::{Entity, EntityType, KnowledgeGraph, RelationType};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Group key for entities without any status.
pub const UNKNOWN_STATUS: &str = "unknown";

/// A milestone with its parsed fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSummary {
    /// Milestone name.
    pub name: String,
    /// Parsed observation fields.
    #[serde(flatten)]
    pub fields: MilestoneFields,
}

/// Counts and rates over a project's contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    /// Number of tasks.
    pub task_count: usize,
    /// Number of tasks whose status reads as completed.
    pub completed_tasks: usize,
    /// Completed tasks as a percentage of all tasks; 0 without tasks.
    pub task_completion_rate: f64,
    /// Number of milestones.
    pub milestone_count: usize,
    /// Milestones dated today or later.
    pub upcoming_milestone_count: usize,
    /// Number of issues.
    pub issue_count: usize,
    /// Number of risks.
    pub risk_count: usize,
    /// Number of distinct team members.
    pub team_size: usize,
    /// Number of resources.
    pub resource_count: usize,
}

/// Everything directly attached to a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    /// The project entity.
    pub project: Entity,
    /// Parsed project fields.
    pub fields: ProjectFields,
    /// Current project status.
    pub status: Option<String>,
    /// Components `part_of` the project.
    pub components: Vec<Entity>,
    /// Tasks grouped by status.
    pub tasks_by_status: BTreeMap<String, Vec<Entity>>,
    /// Issues grouped by status.
    pub issues_by_status: BTreeMap<String, Vec<Entity>>,
    /// Milestones by ascending date, undated last.
    pub milestones: Vec<MilestoneSummary>,
    /// Milestones dated today or later.
    pub upcoming_milestones: Vec<MilestoneSummary>,
    /// Team members assigned to, managing or contributing to the project.
    pub team: Vec<Entity>,
    /// Risks `part_of` the project.
    pub risks: Vec<Entity>,
    /// Resources `part_of` the project.
    pub resources: Vec<Entity>,
    /// Stakeholders of the project.
    pub stakeholders: Vec<Entity>,
    /// Counts and rates.
    pub summary: OverviewSummary,
}

/// Relation types that make a team member part of a project's team.
pub(crate) const TEAM_RELATIONS: &[RelationType] = &[
    RelationType::AssignedTo,
    RelationType::Manages,
    RelationType::ContributesTo,
];

/// Percentage of `part` in `whole`, 0 when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Resolve `name` as a project or fail.
pub(crate) fn require_project<'g>(graph: &'g KnowledgeGraph, name: &str) -> Result<&'g Entity> {
    graph
        .entity_of_type(name, EntityType::Project)
        .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
}

/// Milestones of `project` sorted by date, undated last in original order.
pub(crate) fn sorted_milestones(graph: &KnowledgeGraph, project: &str) -> Vec<MilestoneSummary> {
    let mut milestones: Vec<MilestoneSummary> = graph
        .parts_of(project, EntityType::Milestone)
        .into_iter()
        .map(|m| MilestoneSummary {
            name: m.name.clone(),
            fields: MilestoneFields::from(m),
        })
        .collect();
    milestones.sort_by(|a, b| cmp_dates_undated_last(a.fields.date, b.fields.date));
    milestones
}

fn group_by_status(index: &StatusIndex, entities: &[&Entity]) -> BTreeMap<String, Vec<Entity>> {
    let mut groups: BTreeMap<String, Vec<Entity>> = BTreeMap::new();
    for entity in entities {
        let status = index
            .effective_status(entity)
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
        groups.entry(status).or_default().push((*entity).clone());
    }
    groups
}

fn cloned(entities: Vec<&Entity>) -> Vec<Entity> {
    entities.into_iter().cloned().collect()
}

/// Build the overview of `project_name` as of `today`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn project_overview(
    graph: &KnowledgeGraph,
    project_name: &str,
    today: NaiveDate,
) -> Result<ProjectOverview> {
    let project = require_project(graph, project_name)?;
    let index = StatusIndex::build(graph);

    let tasks = graph.parts_of(project_name, EntityType::Task);
    let issues = graph.parts_of(project_name, EntityType::Issue);
    let team = graph.sources_of(project_name, TEAM_RELATIONS, Some(EntityType::TeamMember));
    let stakeholders = graph.sources_of(project_name, &[RelationType::StakeholderOf], None);

    let milestones = sorted_milestones(graph, project_name);
    let upcoming_milestones: Vec<MilestoneSummary> = milestones
        .iter()
        .filter(|m| m.fields.date.is_some_and(|d| d >= today))
        .cloned()
        .collect();

    let completed_tasks = tasks.iter().filter(|t| index.is_completed(t)).count();
    let risks = cloned(graph.parts_of(project_name, EntityType::Risk));
    let resources = cloned(graph.parts_of(project_name, EntityType::Resource));

    let summary = OverviewSummary {
        task_count: tasks.len(),
        completed_tasks,
        task_completion_rate: percentage(completed_tasks, tasks.len()),
        milestone_count: milestones.len(),
        upcoming_milestone_count: upcoming_milestones.len(),
        issue_count: issues.len(),
        risk_count: risks.len(),
        team_size: team.len(),
        resource_count: resources.len(),
    };
    debug!(project = project_name, ?summary, "Built project overview");

    Ok(ProjectOverview {
        project: project.clone(),
        fields: ProjectFields::from(project),
        status: index.effective_status(project),
        components: cloned(graph.parts_of(project_name, EntityType::Component)),
        tasks_by_status: group_by_status(&index, &tasks),
        issues_by_status: group_by_status(&index, &issues),
        milestones,
        upcoming_milestones,
        team: cloned(team),
        risks,
        resources,
        stakeholders: cloned(stakeholders),
        summary,
    })
}

impl GraphStore {
    /// Consolidated view of a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_project_overview(&self, project: &str) -> Result<ProjectOverview> {
        let graph = self.load().await;
        project_overview(&graph, project, self.today())
    }
}
