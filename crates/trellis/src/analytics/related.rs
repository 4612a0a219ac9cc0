//! Connections between projects.
//!
//! Two projects are connected through shared team members, shared
//! resources, shared stakeholders or a direct `depends_on` relation. Each
//! kind carries a weight; the weighted sum is the connection strength.

use crate::domain::{Entity, EntityType, KnowledgeGraph, RelationType};
use crate::error::Result;
use crate::graph::GraphStore;
use crate::graph::overview::{TEAM_RELATIONS, require_project};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Depth used when the caller does not give one.
pub const DEFAULT_RELATED_DEPTH: usize = 1;

const TEAM_WEIGHT: f64 = 2.0;
const RESOURCE_WEIGHT: f64 = 1.5;
const DEPENDENCY_WEIGHT: f64 = 3.0;
const STAKEHOLDER_WEIGHT: f64 = 1.0;

/// Dominant kind of connection between two projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// A direct `depends_on` relation in either direction.
    Dependency,
    /// At least one shared team member.
    SharedTeam,
    /// At least one shared resource.
    SharedResources,
    /// At least one shared stakeholder.
    SharedStakeholders,
}

/// A project connected to the seed, directly or through other projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedProject {
    /// Related project name.
    pub name: String,
    /// Project it was reached from.
    pub via: String,
    /// Hops from the seed project.
    pub depth: usize,
    /// Weighted connection strength.
    pub strength: f64,
    /// Dominant connection kind.
    pub connection_type: ConnectionType,
    /// Team members on both projects.
    pub shared_team: Vec<String>,
    /// Resources of both projects.
    pub shared_resources: Vec<String>,
    /// Stakeholders of both projects.
    pub shared_stakeholders: Vec<String>,
    /// Whether either project `depends_on` the other.
    pub direct_dependency: bool,
}

/// Result of [`GraphStore::find_related_projects`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedProjects {
    /// Seed project.
    pub project: String,
    /// Depth bound used.
    pub depth: usize,
    /// Related projects by descending strength.
    pub related: Vec<RelatedProject>,
}

struct Members {
    team: HashSet<String>,
    resources: HashSet<String>,
    stakeholders: HashSet<String>,
}

impl Members {
    fn of(graph: &KnowledgeGraph, project: &str) -> Self {
        let names = |entities: Vec<&Entity>| {
            entities.into_iter().map(|e| e.name.clone()).collect()
        };
        Self {
            team: names(graph.sources_of(project, TEAM_RELATIONS, Some(EntityType::TeamMember))),
            resources: names(graph.parts_of(project, EntityType::Resource)),
            stakeholders: names(graph.sources_of(project, &[RelationType::StakeholderOf], None)),
        }
    }
}

fn shared(a: &HashSet<String>, b: &HashSet<String>) -> Vec<String> {
    let mut names: Vec<String> = a.intersection(b).cloned().collect();
    names.sort();
    names
}

#[allow(clippy::cast_precision_loss)]
fn connection(
    graph: &KnowledgeGraph,
    from: &str,
    to: &str,
    depth: usize,
) -> Option<RelatedProject> {
    let (a, b) = (Members::of(graph, from), Members::of(graph, to));
    let shared_team = shared(&a.team, &b.team);
    let shared_resources = shared(&a.resources, &b.resources);
    let shared_stakeholders = shared(&a.stakeholders, &b.stakeholders);
    let direct_dependency = graph.has_relation(from, to, RelationType::DependsOn)
        || graph.has_relation(to, from, RelationType::DependsOn);

    let strength = TEAM_WEIGHT * shared_team.len() as f64
        + RESOURCE_WEIGHT * shared_resources.len() as f64
        + DEPENDENCY_WEIGHT * f64::from(u8::from(direct_dependency))
        + STAKEHOLDER_WEIGHT * shared_stakeholders.len() as f64;
    if strength <= 0.0 {
        return None;
    }

    let connection_type = if direct_dependency {
        ConnectionType::Dependency
    } else if !shared_team.is_empty() {
        ConnectionType::SharedTeam
    } else if !shared_resources.is_empty() {
        ConnectionType::SharedResources
    } else {
        ConnectionType::SharedStakeholders
    };

    Some(RelatedProject {
        name: to.to_string(),
        via: from.to_string(),
        depth,
        strength,
        connection_type,
        shared_team,
        shared_resources,
        shared_stakeholders,
        direct_dependency,
    })
}

fn explore(
    graph: &KnowledgeGraph,
    from: &str,
    level: usize,
    max_depth: usize,
    visited: &mut HashSet<String>,
    found: &mut Vec<RelatedProject>,
) {
    if level > max_depth {
        return;
    }
    for candidate in graph.entities_of_type(EntityType::Project) {
        if visited.contains(&candidate.name) {
            continue;
        }
        if let Some(related) = connection(graph, from, &candidate.name, level) {
            visited.insert(candidate.name.clone());
            found.push(related);
            explore(graph, &candidate.name, level + 1, max_depth, visited, found);
        }
    }
}

/// Projects connected to `project` within `depth` hops.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn related_projects(
    graph: &KnowledgeGraph,
    project: &str,
    depth: usize,
) -> Result<RelatedProjects> {
    require_project(graph, project)?;

    let mut visited = HashSet::from([project.to_string()]);
    let mut related = Vec::new();
    explore(graph, project, 1, depth, &mut visited, &mut related);
    related.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    debug!(project, depth, found = related.len(), "Explored related projects");

    Ok(RelatedProjects {
        project: project.to_string(),
        depth,
        related,
    })
}

impl GraphStore {
    /// Projects connected to a project, up to `depth` hops away.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn find_related_projects(
        &self,
        project: &str,
        depth: Option<usize>,
    ) -> Result<RelatedProjects> {
        let graph = self.load().await;
        related_projects(&graph, project, depth.unwrap_or(DEFAULT_RELATED_DEPTH))
    }
}
