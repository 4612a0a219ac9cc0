//! Chronological event list for a project.

use crate::domain::fields::{MilestoneFields, ProjectFields, TaskFields};
use crate::domain::{EntityType, KnowledgeGraph};
use crate::error::Result;
use crate::graph::overview::require_project;
use crate::graph::{GraphStore, StatusIndex};
use chrono::NaiveDate;
use serde::Serialize;

/// What a timeline event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The project's `StartDate:`.
    ProjectStart,
    /// A milestone's `Date:`.
    Milestone,
    /// A task's `DueDate:`.
    TaskDue,
    /// The project's `EndDate:`.
    ProjectEnd,
}

/// One dated point on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Event date.
    pub date: NaiveDate,
    /// Event kind.
    pub kind: EventKind,
    /// Entity the event belongs to.
    pub name: String,
    /// Effective status of that entity.
    pub status: Option<String>,
    /// Days since the previous event.
    pub days_from_previous: Option<i64>,
    /// Days until the next event.
    pub days_to_next: Option<i64>,
}

/// Result of [`GraphStore::get_project_timeline`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeline {
    /// Project name.
    pub project: String,
    /// Events in date order.
    pub events: Vec<TimelineEvent>,
    /// Index of the first event dated today or later.
    pub current_position: Option<usize>,
    /// Days between the first and last event.
    pub total_days: Option<i64>,
    /// Elapsed share of the span between first and last event, 0 to 100.
    pub progress_percentage: f64,
}

#[allow(clippy::cast_precision_loss)]
fn progress(first: NaiveDate, last: NaiveDate, today: NaiveDate) -> f64 {
    let span = (last - first).num_days();
    if span <= 0 {
        return if today >= first { 100.0 } else { 0.0 };
    }
    let elapsed = (today - first).num_days() as f64;
    (elapsed / span as f64 * 100.0).clamp(0.0, 100.0)
}

/// Timeline of `project` as of `today`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn project_timeline(
    graph: &KnowledgeGraph,
    project: &str,
    today: NaiveDate,
) -> Result<ProjectTimeline> {
    let entity = require_project(graph, project)?;
    let index = StatusIndex::build(graph);
    let fields = ProjectFields::from(entity);
    let project_status = index.effective_status(entity);

    let event = |date, kind, name: &str, status| TimelineEvent {
        date,
        kind,
        name: name.to_string(),
        status,
        days_from_previous: None,
        days_to_next: None,
    };

    let mut events = Vec::new();
    if let Some(start) = fields.start_date {
        events.push(event(start, EventKind::ProjectStart, project, project_status.clone()));
    }
    for milestone in graph.parts_of(project, EntityType::Milestone) {
        if let Some(date) = MilestoneFields::from(milestone).date {
            let status = index.effective_status(milestone);
            events.push(event(date, EventKind::Milestone, &milestone.name, status));
        }
    }
    for task in graph.parts_of(project, EntityType::Task) {
        if let Some(due) = TaskFields::from(task).due_date {
            events.push(event(due, EventKind::TaskDue, &task.name, index.effective_status(task)));
        }
    }
    if let Some(end) = fields.end_date {
        events.push(event(end, EventKind::ProjectEnd, project, project_status));
    }

    events.sort_by_key(|e| e.date);
    let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
    for (i, event) in events.iter_mut().enumerate() {
        if i > 0 {
            event.days_from_previous = Some((dates[i] - dates[i - 1]).num_days());
        }
        if let Some(next) = dates.get(i + 1) {
            event.days_to_next = Some((*next - dates[i]).num_days());
        }
    }

    let (total_days, progress_percentage) = match (dates.first(), dates.last()) {
        (Some(&first), Some(&last)) => (Some((last - first).num_days()), progress(first, last, today)),
        _ => (None, 0.0),
    };

    Ok(ProjectTimeline {
        project: project.to_string(),
        current_position: dates.iter().position(|d| *d >= today),
        events,
        total_days,
        progress_percentage,
    })
}

impl GraphStore {
    /// Chronological timeline of a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_project_timeline(&self, project: &str) -> Result<ProjectTimeline> {
        let graph = self.load().await;
        project_timeline(&graph, project, self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Relation, RelationType};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![
                Entity::new("P", EntityType::Project)
                    .with_observations(["StartDate: 2025-01-01", "EndDate: 2025-01-21"]),
                Entity::new("Beta", EntityType::Milestone).with_observations(["Date: 2025-01-11"]),
                Entity::new("Ship", EntityType::Task).with_observations(["DueDate: 2025-01-16"]),
                Entity::new("Vague", EntityType::Task),
            ],
            relations: vec![
                Relation::new("Beta", "P", RelationType::PartOf),
                Relation::new("Ship", "P", RelationType::PartOf),
                Relation::new("Vague", "P", RelationType::PartOf),
            ],
        }
    }

    #[test]
    fn events_are_sorted_with_deltas() {
        let timeline = project_timeline(&graph(), "P", date(1, 11)).unwrap();
        let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            [EventKind::ProjectStart, EventKind::Milestone, EventKind::TaskDue, EventKind::ProjectEnd]
        );
        assert_eq!(timeline.events[0].days_from_previous, None);
        assert_eq!(timeline.events[1].days_from_previous, Some(10));
        assert_eq!(timeline.events[2].days_to_next, Some(5));
        assert_eq!(timeline.events[3].days_to_next, None);
        assert_eq!(timeline.total_days, Some(20));
    }

    #[test]
    fn current_position_and_progress() {
        let timeline = project_timeline(&graph(), "P", date(1, 11)).unwrap();
        assert_eq!(timeline.current_position, Some(1));
        assert_eq!(timeline.progress_percentage, 50.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(project_timeline(&graph(), "P", date(3, 1)).unwrap().progress_percentage, 100.0);
        let before = project_timeline(&graph(), "P", NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(before.unwrap().progress_percentage, 0.0);
    }

    #[test]
    fn project_without_dates_is_empty() {
        let graph = KnowledgeGraph {
            entities: vec![Entity::new("P", EntityType::Project)],
            relations: vec![],
        };
        let timeline = project_timeline(&graph, "P", date(1, 1)).unwrap();
        assert!(timeline.events.is_empty());
        assert_eq!(timeline.current_position, None);
        assert_eq!(timeline.progress_percentage, 0.0);
    }
}
