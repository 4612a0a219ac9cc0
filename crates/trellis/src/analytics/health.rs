//! Project health scoring.
//!
//! The score is the mean of nine factors in `[0, 100]`. Eight are ratios over
//! tasks, milestones, issues and risks, each neutral (50) when there is
//! nothing to measure. The ninth compares completion against elapsed time.

use crate::domain::fields::ProjectFields;
use crate::domain::{Entity, EntityType, KnowledgeGraph, StatusValue};
use crate::error::Result;
use crate::graph::overview::require_project;
use crate::graph::{GraphStore, StatusIndex};
use chrono::NaiveDate;
use serde::Serialize;

const NEUTRAL: f64 = 50.0;
const ON_SCHEDULE: f64 = 70.0;
const BEHIND_SCHEDULE: f64 = 30.0;
/// Completion may trail elapsed time by this many points before it counts as slip.
const SLIP_TOLERANCE: f64 = 15.0;

const RESOLVED_ISSUE: &[&str] = &["resolved", "closed", "completed", "done", "fixed"];
const MITIGATED_RISK: &[&str] = &["mitigated", "resolved", "closed"];
const ACTIVE_RISK: &[&str] = &["active", "open", "occurred", "identified"];
const REACHED_MILESTONE: &[&str] = &["reached", "completed", "done"];
const MISSED_MILESTONE: &[&str] = &["missed"];

/// Health band of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    /// Score 80 and above.
    Healthy,
    /// Score 60 to 80.
    AttentionNeeded,
    /// Score 40 to 60.
    AtRisk,
    /// Score below 40.
    Critical,
}

impl HealthCategory {
    /// Band for `score`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Healthy
        } else if score >= 60.0 {
            Self::AttentionNeeded
        } else if score >= 40.0 {
            Self::AtRisk
        } else {
            Self::Critical
        }
    }
}

/// Raw counts behind the factors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    /// Tasks `part_of` the project.
    pub tasks: usize,
    /// Tasks reading as completed.
    pub completed_tasks: usize,
    /// Tasks reading as blocked.
    pub blocked_tasks: usize,
    /// Milestones `part_of` the project.
    pub milestones: usize,
    /// Milestones reached.
    pub reached_milestones: usize,
    /// Milestones missed.
    pub missed_milestones: usize,
    /// Issues `part_of` the project.
    pub issues: usize,
    /// Issues resolved, closed or fixed.
    pub resolved_issues: usize,
    /// Issues not resolved.
    pub open_issues: usize,
    /// Risks `part_of` the project.
    pub risks: usize,
    /// Risks mitigated or closed.
    pub mitigated_risks: usize,
    /// Risks open, occurred or without a status.
    pub active_risks: usize,
    /// Elapsed share of the project's start-to-end span, when both dates are known.
    pub elapsed_percentage: Option<f64>,
    /// Completion trails elapsed time by more than the tolerance.
    pub schedule_slip: bool,
}

/// The nine factors, each in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct HealthFactors {
    pub task_completion: f64,
    pub unblocked_tasks: f64,
    pub milestone_completion: f64,
    pub milestones_not_missed: f64,
    pub issue_resolution: f64,
    pub issues_not_open: f64,
    pub risk_mitigation: f64,
    pub risks_not_active: f64,
    /// 70 on schedule, 30 behind, 50 without project dates.
    pub schedule: f64,
}

impl HealthFactors {
    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> f64 {
        let all = [
            self.task_completion,
            self.unblocked_tasks,
            self.milestone_completion,
            self.milestones_not_missed,
            self.issue_resolution,
            self.issues_not_open,
            self.risk_mitigation,
            self.risks_not_active,
            self.schedule,
        ];
        all.iter().sum::<f64>() / all.len() as f64
    }
}

/// Result of [`GraphStore::get_project_health`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHealth {
    /// Project name.
    pub project: String,
    /// Mean of the factors.
    pub score: f64,
    /// Health band.
    pub category: HealthCategory,
    /// Individual factors.
    pub factors: HealthFactors,
    /// Raw counts.
    pub metrics: HealthMetrics,
    /// Suggested actions.
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Category(HealthCategory),
    BlockedTasks,
    OpenIssues,
    ActiveRisks,
    ScheduleSlip,
}

const RECOMMENDATIONS: &[(Trigger, &str)] = &[
    (
        Trigger::Category(HealthCategory::Critical),
        "Escalate to stakeholders and re-plan the remaining scope",
    ),
    (
        Trigger::Category(HealthCategory::AtRisk),
        "Hold a project review focused on the weakest health factors",
    ),
    (
        Trigger::Category(HealthCategory::AttentionNeeded),
        "Track the lagging factors at the next status meeting",
    ),
    (
        Trigger::Category(HealthCategory::Healthy),
        "Keep the current cadence and re-check health regularly",
    ),
    (Trigger::BlockedTasks, "Unblock stalled tasks or re-assign their dependencies"),
    (Trigger::OpenIssues, "Triage open issues and give each an owner"),
    (Trigger::ActiveRisks, "Review mitigation plans for active risks"),
    (
        Trigger::ScheduleSlip,
        "Completion trails the schedule; re-prioritize work or move the end date",
    ),
];

/// Ratio of `part` to `whole` as a percentage, neutral when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        NEUTRAL
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Inverse ratio, neutral when `whole` is zero.
fn inverse(part: usize, whole: usize) -> f64 {
    if whole == 0 { NEUTRAL } else { 100.0 - ratio(part, whole) }
}

fn status_in(index: &StatusIndex, entity: &Entity, set: &[&str]) -> bool {
    index
        .effective_status(entity)
        .is_some_and(|s| set.contains(&s.as_str()))
}

fn count(entities: &[&Entity], pred: impl Fn(&Entity) -> bool) -> usize {
    entities.iter().filter(|&&e| pred(e)).count()
}

fn has_status(index: &StatusIndex, entity: &Entity, value: StatusValue) -> bool {
    index
        .effective_status(entity)
        .and_then(|s| StatusValue::from_alias(&s))
        == Some(value)
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_percentage(fields: &ProjectFields, today: NaiveDate) -> Option<f64> {
    let (start, end) = (fields.start_date?, fields.end_date?);
    let span = (end - start).num_days();
    if span <= 0 {
        return None;
    }
    let elapsed = (today - start).num_days() as f64;
    Some((elapsed / span as f64 * 100.0).clamp(0.0, 100.0))
}

fn recommendations(category: HealthCategory, metrics: &HealthMetrics) -> Vec<String> {
    RECOMMENDATIONS
        .iter()
        .filter(|(trigger, _)| match trigger {
            Trigger::Category(c) => *c == category,
            Trigger::BlockedTasks => metrics.blocked_tasks > 0,
            Trigger::OpenIssues => metrics.open_issues > 0,
            Trigger::ActiveRisks => metrics.active_risks > 0,
            Trigger::ScheduleSlip => metrics.schedule_slip,
        })
        .map(|(_, text)| (*text).to_string())
        .collect()
}

/// Health of `project` as of `today`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn project_health(
    graph: &KnowledgeGraph,
    project: &str,
    today: NaiveDate,
) -> Result<ProjectHealth> {
    let entity = require_project(graph, project)?;
    let index = StatusIndex::build(graph);

    let tasks = graph.parts_of(project, EntityType::Task);
    let milestones = graph.parts_of(project, EntityType::Milestone);
    let issues = graph.parts_of(project, EntityType::Issue);
    let risks = graph.parts_of(project, EntityType::Risk);

    let resolved_issues = count(&issues, |e| status_in(&index, e, RESOLVED_ISSUE));
    let mut metrics = HealthMetrics {
        tasks: tasks.len(),
        completed_tasks: count(&tasks, |e| has_status(&index, e, StatusValue::Completed)),
        blocked_tasks: count(&tasks, |e| has_status(&index, e, StatusValue::Blocked)),
        milestones: milestones.len(),
        reached_milestones: count(&milestones, |e| status_in(&index, e, REACHED_MILESTONE)),
        missed_milestones: count(&milestones, |e| status_in(&index, e, MISSED_MILESTONE)),
        issues: issues.len(),
        resolved_issues,
        open_issues: issues.len() - resolved_issues,
        risks: risks.len(),
        mitigated_risks: count(&risks, |e| status_in(&index, e, MITIGATED_RISK)),
        active_risks: count(&risks, |e| {
            index.effective_status(e).is_none() || status_in(&index, e, ACTIVE_RISK)
        }),
        elapsed_percentage: elapsed_percentage(&ProjectFields::from(entity), today),
        schedule_slip: false,
    };

    let completion = ratio(metrics.completed_tasks, metrics.tasks);
    let schedule = match metrics.elapsed_percentage {
        None => NEUTRAL,
        Some(elapsed) if completion < elapsed - SLIP_TOLERANCE => {
            metrics.schedule_slip = true;
            BEHIND_SCHEDULE
        }
        Some(_) => ON_SCHEDULE,
    };

    let factors = HealthFactors {
        task_completion: completion,
        unblocked_tasks: inverse(metrics.blocked_tasks, metrics.tasks),
        milestone_completion: ratio(metrics.reached_milestones, metrics.milestones),
        milestones_not_missed: inverse(metrics.missed_milestones, metrics.milestones),
        issue_resolution: ratio(metrics.resolved_issues, metrics.issues),
        issues_not_open: inverse(metrics.open_issues, metrics.issues),
        risk_mitigation: ratio(metrics.mitigated_risks, metrics.risks),
        risks_not_active: inverse(metrics.active_risks, metrics.risks),
        schedule,
    };
    let score = factors.mean();
    let category = HealthCategory::from_score(score);

    Ok(ProjectHealth {
        project: project.to_string(),
        score,
        category,
        recommendations: recommendations(category, &metrics),
        factors,
        metrics,
    })
}

impl GraphStore {
    /// Health score, factors and recommendations for a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_project_health(&self, project: &str) -> Result<ProjectHealth> {
        let graph = self.load().await;
        project_health(&graph, project, self.today())
    }
}
