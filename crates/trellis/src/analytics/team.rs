//! Workload of one team member across projects.

use crate::domain::fields::{MemberFields, TaskFields, cmp_dates_undated_last};
use crate::domain::{Entity, EntityType, KnowledgeGraph, RelationType};
use crate::error::{Error, Result};
use crate::graph::overview::{UNKNOWN_STATUS, percentage};
use crate::graph::{GraphStore, StatusIndex};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Group key for tasks not `part_of` any project.
pub const UNASSIGNED_PROJECT: &str = "unassigned";

/// A task assigned to the member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    /// Task name.
    pub name: String,
    /// Project the task is `part_of`.
    pub project: Option<String>,
    /// Effective status.
    pub status: Option<String>,
    /// `DueDate:` field.
    pub due_date: Option<NaiveDate>,
    /// Indexed priority, else the `Priority:` field.
    pub priority: Option<String>,
}

/// Result of [`GraphStore::get_team_member_assignments`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAssignments {
    /// Member name.
    pub member: String,
    /// Parsed member fields.
    pub fields: MemberFields,
    /// Tasks grouped by project, then by status.
    pub by_project: BTreeMap<String, BTreeMap<String, Vec<AssignedTask>>>,
    /// Number of assigned tasks.
    pub task_count: usize,
    /// Number of completed assigned tasks.
    pub completed_count: usize,
    /// Completed tasks as a percentage of assigned tasks.
    pub completion_rate: f64,
    /// Open tasks due within the look-ahead window.
    pub upcoming: Vec<AssignedTask>,
    /// Open tasks past their due date.
    pub overdue: Vec<AssignedTask>,
}

fn assigned_tasks<'g>(graph: &'g KnowledgeGraph, member: &str) -> Vec<&'g Entity> {
    let types = [RelationType::AssignedTo];
    let task = Some(EntityType::Task);
    let mut seen = HashSet::new();
    graph
        .sources_of(member, &types, task)
        .into_iter()
        .chain(graph.targets_of(member, &types, task))
        .filter(|t| seen.insert(t.name.as_str()))
        .collect()
}

fn by_due_date(tasks: &mut [AssignedTask]) {
    tasks.sort_by(|a, b| cmp_dates_undated_last(a.due_date, b.due_date));
}

/// Assignments of `member_name` as of `today`.
///
/// # Errors
///
/// - `Error::TeamMemberNotFound` if no team member has this name
pub fn team_assignments(
    graph: &KnowledgeGraph,
    member_name: &str,
    today: NaiveDate,
    window_days: i64,
) -> Result<TeamAssignments> {
    let member = graph
        .entity_of_type(member_name, EntityType::TeamMember)
        .ok_or_else(|| Error::TeamMemberNotFound(member_name.to_string()))?;
    let index = StatusIndex::build(graph);
    let horizon = Duration::try_days(window_days)
        .and_then(|window| today.checked_add_signed(window))
        .unwrap_or(NaiveDate::MAX);

    let mut by_project: BTreeMap<String, BTreeMap<String, Vec<AssignedTask>>> = BTreeMap::new();
    let mut upcoming = Vec::new();
    let mut overdue = Vec::new();
    let mut completed_count = 0;

    let tasks = assigned_tasks(graph, member_name);
    for task in &tasks {
        let fields = TaskFields::from(*task);
        let project = graph
            .targets_of(&task.name, &[RelationType::PartOf], Some(EntityType::Project))
            .first()
            .map(|p| p.name.clone());
        let assigned = AssignedTask {
            name: task.name.clone(),
            project: project.clone(),
            status: index.effective_status(task),
            due_date: fields.due_date,
            priority: index
                .priority(&task.name)
                .map(str::to_string)
                .or(fields.priority),
        };

        if index.is_completed(task) {
            completed_count += 1;
        } else if let Some(due) = assigned.due_date {
            if due < today {
                overdue.push(assigned.clone());
            } else if due <= horizon {
                upcoming.push(assigned.clone());
            }
        }

        let status = assigned
            .status
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
        by_project
            .entry(project.unwrap_or_else(|| UNASSIGNED_PROJECT.to_string()))
            .or_default()
            .entry(status)
            .or_default()
            .push(assigned);
    }

    by_due_date(&mut upcoming);
    by_due_date(&mut overdue);

    Ok(TeamAssignments {
        member: member.name.clone(),
        fields: MemberFields::from(member),
        by_project,
        task_count: tasks.len(),
        completed_count,
        completion_rate: percentage(completed_count, tasks.len()),
        upcoming,
        overdue,
    })
}

impl GraphStore {
    /// Tasks assigned to a team member, grouped and partitioned by due date.
    ///
    /// # Errors
    ///
    /// - `Error::TeamMemberNotFound` if no team member has this name
    pub async fn get_team_member_assignments(&self, member: &str) -> Result<TeamAssignments> {
        let graph = self.load().await;
        team_assignments(&graph, member, self.today(), self.upcoming_window_days())
    }
}
