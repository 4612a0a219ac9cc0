//! Risk scoring for a project.

use crate::domain::fields::RiskFields;
use crate::domain::{EntityType, KnowledgeGraph, RelationType};
use crate::error::Result;
use crate::graph::GraphStore;
use crate::graph::overview::require_project;
use serde::Serialize;
use std::cmp::Ordering;

/// Scores at or above this are high priority.
pub const HIGH_PRIORITY_SCORE: i64 = 15;

/// One assessed risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Risk name.
    pub name: String,
    /// Parsed risk fields.
    pub fields: RiskFields,
    /// Likelihood × impact, when both are integers.
    pub score: Option<i64>,
    /// Score at or above the threshold, or verbal likelihood/impact of "high".
    pub high_priority: bool,
    /// Entities `impacted_by` the risk.
    pub affected: Vec<String>,
}

/// Result of [`GraphStore::get_project_risks`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    /// Project name.
    pub project: String,
    /// Scored risks by descending score, then unscored risks.
    pub risks: Vec<RiskAssessment>,
    /// Names of high-priority risks.
    pub high_priority: Vec<String>,
}

fn is_high(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.trim().eq_ignore_ascii_case("high"))
}

fn score(fields: &RiskFields) -> Option<i64> {
    let parse = |text: Option<&str>| text.and_then(|t| t.trim().parse::<i64>().ok());
    parse(fields.likelihood.as_deref())?.checked_mul(parse(fields.impact.as_deref())?)
}

fn by_score_descending(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Assess every risk `part_of` `project`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn project_risks(graph: &KnowledgeGraph, project: &str) -> Result<RiskReport> {
    require_project(graph, project)?;

    let mut risks: Vec<RiskAssessment> = graph
        .parts_of(project, EntityType::Risk)
        .into_iter()
        .map(|risk| {
            let fields = RiskFields::from(risk);
            let score = score(&fields);
            let high_priority = score.is_some_and(|s| s >= HIGH_PRIORITY_SCORE)
                || is_high(fields.impact.as_deref())
                || is_high(fields.likelihood.as_deref());
            RiskAssessment {
                name: risk.name.clone(),
                affected: graph
                    .sources_of(&risk.name, &[RelationType::ImpactedBy], None)
                    .iter()
                    .map(|e| e.name.clone())
                    .collect(),
                fields,
                score,
                high_priority,
            }
        })
        .collect();
    risks.sort_by(|a, b| by_score_descending(a.score, b.score));

    let high_priority = risks
        .iter()
        .filter(|r| r.high_priority)
        .map(|r| r.name.clone())
        .collect();

    Ok(RiskReport {
        project: project.to_string(),
        risks,
        high_priority,
    })
}

impl GraphStore {
    /// Scored risks of a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_project_risks(&self, project: &str) -> Result<RiskReport> {
        let graph = self.load().await;
        project_risks(&graph, project)
    }
}
