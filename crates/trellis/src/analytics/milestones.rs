//! Per-milestone progress rollup.

use crate::domain::fields::{MilestoneFields, cmp_dates_undated_last};
use crate::domain::{EntityType, KnowledgeGraph, RelationType};
use crate::error::Result;
use crate::graph::overview::{percentage, require_project};
use crate::graph::{GraphStore, StatusIndex};
use chrono::NaiveDate;
use serde::Serialize;

const REACHED: &str = "reached";
const MISSED: &str = "missed";

/// Progress of one milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    /// Milestone name.
    pub name: String,
    /// Parsed milestone fields.
    pub fields: MilestoneFields,
    /// Effective milestone status.
    pub status: Option<String>,
    /// Tasks `required_for` the milestone.
    pub tasks: Vec<String>,
    /// Completed required tasks.
    pub completed_tasks: usize,
    /// 0 to 100.
    pub completion_percentage: f64,
    /// Signed days from today to the milestone date.
    pub days_remaining: Option<i64>,
    /// Date has passed and the milestone was neither reached nor missed.
    pub overdue: bool,
}

/// Result of [`GraphStore::get_milestone_progress`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneReport {
    /// Project name.
    pub project: String,
    /// Milestones by ascending date, undated last.
    pub milestones: Vec<MilestoneProgress>,
}

/// Progress of every milestone of `project` as of `today`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn milestone_progress(
    graph: &KnowledgeGraph,
    project: &str,
    today: NaiveDate,
) -> Result<MilestoneReport> {
    require_project(graph, project)?;
    let index = StatusIndex::build(graph);

    let mut milestones: Vec<MilestoneProgress> = graph
        .parts_of(project, EntityType::Milestone)
        .into_iter()
        .map(|milestone| {
            let fields = MilestoneFields::from(milestone);
            let status = index.effective_status(milestone);
            let tasks =
                graph.sources_of(&milestone.name, &[RelationType::RequiredFor], Some(EntityType::Task));
            let completed_tasks = tasks.iter().filter(|t| index.is_completed(t)).count();

            let reached = status.as_deref() == Some(REACHED);
            let settled = reached || status.as_deref() == Some(MISSED);
            let completion_percentage = if tasks.is_empty() && reached {
                100.0
            } else {
                percentage(completed_tasks, tasks.len())
            };

            MilestoneProgress {
                name: milestone.name.clone(),
                days_remaining: fields.date.map(|d| (d - today).num_days()),
                overdue: fields.date.is_some_and(|d| d < today) && !settled,
                fields,
                status,
                tasks: tasks.iter().map(|t| t.name.clone()).collect(),
                completed_tasks,
                completion_percentage,
            }
        })
        .collect();
    milestones.sort_by(|a, b| cmp_dates_undated_last(a.fields.date, b.fields.date));

    Ok(MilestoneReport {
        project: project.to_string(),
        milestones,
    })
}

impl GraphStore {
    /// Progress of every milestone in a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_milestone_progress(&self, project: &str) -> Result<MilestoneReport> {
        let graph = self.load().await;
        milestone_progress(&graph, project, self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Relation};
    use rstest::rstest;

    fn graph(milestone_obs: &[&str], task_statuses: &[&str]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph {
            entities: vec![
                Entity::new("P", EntityType::Project),
                Entity::new("M", EntityType::Milestone)
                    .with_observations(milestone_obs.iter().copied()),
            ],
            relations: vec![Relation::new("M", "P", RelationType::PartOf)],
        };
        for (i, status) in task_statuses.iter().enumerate() {
            let name = format!("T{i}");
            graph.entities.push(
                Entity::new(&name, EntityType::Task).with_observations([format!("Status: {status}")]),
            );
            graph
                .relations
                .push(Relation::new(name, "M", RelationType::RequiredFor));
        }
        graph
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
    }

    #[rstest]
    #[case::reached_without_tasks(&["Status: reached"], &[], 100.0)]
    #[case::no_tasks(&[], &[], 0.0)]
    #[case::half_done(&["Status: reached"], &["completed", "active"], 50.0)]
    #[case::aliases_count(&[], &["finished", "done", "todo", "wip"], 50.0)]
    fn completion_percentage(
        #[case] milestone_obs: &[&str],
        #[case] statuses: &[&str],
        #[case] expected: f64,
    ) {
        let report = milestone_progress(&graph(milestone_obs, statuses), "P", today()).unwrap();
        assert_eq!(report.milestones[0].completion_percentage, expected);
    }

    #[rstest]
    #[case::past_open(&["Date: 2025-04-01"], true, Some(-9))]
    #[case::past_reached(&["Date: 2025-04-01", "Status: reached"], false, Some(-9))]
    #[case::past_missed(&["Date: 2025-04-01", "Status: missed"], false, Some(-9))]
    #[case::future(&["Date: 2025-04-20"], false, Some(10))]
    #[case::undated(&[], false, None)]
    fn overdue_and_days_remaining(
        #[case] milestone_obs: &[&str],
        #[case] overdue: bool,
        #[case] days: Option<i64>,
    ) {
        let report = milestone_progress(&graph(milestone_obs, &[]), "P", today()).unwrap();
        assert_eq!(report.milestones[0].overdue, overdue);
        assert_eq!(report.milestones[0].days_remaining, days);
    }
}
