//! Decision log of a project.

use crate::domain::fields::DecisionFields;
use crate::domain::{EntityType, KnowledgeGraph, RelationType};
use crate::error::Result;
use crate::graph::GraphStore;
use crate::graph::overview::require_project;
use serde::Serialize;
use std::cmp::Ordering;

const LINK_RELATIONS: &[RelationType] = &[
    RelationType::ImpactedBy,
    RelationType::RelatedTo,
    RelationType::Documents,
];

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEntry {
    /// Decision name.
    pub name: String,
    /// Parsed decision fields.
    pub fields: DecisionFields,
    /// Other entities linked to the decision.
    pub linked: Vec<String>,
}

/// Result of [`GraphStore::get_decision_log`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLog {
    /// Project name.
    pub project: String,
    /// Decisions, newest first, undated last.
    pub decisions: Vec<DecisionEntry>,
}

/// Decisions attached to `project`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn decision_log(graph: &KnowledgeGraph, project: &str) -> Result<DecisionLog> {
    require_project(graph, project)?;

    let mut decisions: Vec<DecisionEntry> = graph
        .sources_of(
            project,
            &[RelationType::PartOf, RelationType::RelatedTo],
            Some(EntityType::Decision),
        )
        .into_iter()
        .map(|decision| {
            let mut linked: Vec<String> = Vec::new();
            for relation in graph
                .relations
                .iter()
                .filter(|r| LINK_RELATIONS.contains(&r.relation_type) && r.touches(&decision.name))
            {
                let other = if relation.from == decision.name {
                    &relation.to
                } else {
                    &relation.from
                };
                if other != project && !linked.contains(other) {
                    linked.push(other.clone());
                }
            }
            DecisionEntry {
                name: decision.name.clone(),
                fields: DecisionFields::from(decision),
                linked,
            }
        })
        .collect();

    decisions.sort_by(|a, b| match (a.fields.date, b.fields.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(DecisionLog {
        project: project.to_string(),
        decisions,
    })
}

impl GraphStore {
    /// Decisions of a project, newest first.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_decision_log(&self, project: &str) -> Result<DecisionLog> {
        let graph = self.load().await;
        decision_log(&graph, project)
    }
}
