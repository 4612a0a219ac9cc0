//! Resource usage within a project.
//!
//! A resource's load is the number of active tasks that use it, measured
//! against its `Capacity:` field. Tasks use a resource through
//! `task -[depends_on]-> resource` or `resource -[required_for]-> task`;
//! people are attached through `member -[responsible_for|manages]-> resource`.

use crate::domain::fields::ResourceFields;
use crate::domain::{Entity, EntityType, KnowledgeGraph, RelationType, StatusValue};
use crate::error::Result;
use crate::graph::overview::require_project;
use crate::graph::{GraphStore, StatusIndex};
use serde::Serialize;
use std::collections::HashSet;

/// Usage above this percentage is overallocated.
pub const OVERALLOCATED_ABOVE: f64 = 90.0;
/// Usage below this percentage, with at least one task, is underutilized.
pub const UNDERUTILIZED_BELOW: f64 = 20.0;

/// Usage of one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    /// Resource name.
    pub name: String,
    /// Parsed resource fields.
    pub fields: ResourceFields,
    /// Tasks using the resource.
    pub tasks: Vec<String>,
    /// Tasks using the resource whose status is active.
    pub active_tasks: usize,
    /// Team members responsible for the resource.
    pub members: Vec<String>,
    /// 0 to 100.
    pub usage_percentage: f64,
    /// Usage above [`OVERALLOCATED_ABOVE`].
    pub overallocated: bool,
    /// Usage below [`UNDERUTILIZED_BELOW`] with at least one task.
    pub underutilized: bool,
}

/// Result of [`GraphStore::get_resource_allocation`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAllocation {
    /// Project name.
    pub project: String,
    /// Every resource `part_of` the project.
    pub resources: Vec<ResourceUsage>,
    /// Names of overallocated resources.
    pub overallocated: Vec<String>,
    /// Names of underutilized resources.
    pub underutilized: Vec<String>,
}

fn resource_tasks<'g>(graph: &'g KnowledgeGraph, resource: &str) -> Vec<&'g Entity> {
    let task = Some(EntityType::Task);
    let mut seen = HashSet::new();
    graph
        .sources_of(resource, &[RelationType::DependsOn], task)
        .into_iter()
        .chain(graph.targets_of(resource, &[RelationType::RequiredFor], task))
        .filter(|t| seen.insert(t.name.as_str()))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn usage(active_tasks: usize, total_tasks: usize, capacity: Option<u32>) -> f64 {
    match capacity {
        Some(capacity) => (active_tasks as f64 / f64::from(capacity) * 100.0).min(100.0),
        None if total_tasks > 0 => 50.0,
        None => 0.0,
    }
}

/// Allocation of every resource in `project`.
///
/// # Errors
///
/// - `Error::ProjectNotFound` if no project has this name
pub fn resource_allocation(graph: &KnowledgeGraph, project: &str) -> Result<ResourceAllocation> {
    require_project(graph, project)?;
    let index = StatusIndex::build(graph);

    let resources: Vec<ResourceUsage> = graph
        .parts_of(project, EntityType::Resource)
        .into_iter()
        .map(|resource| {
            let fields = ResourceFields::from(resource);
            let tasks = resource_tasks(graph, &resource.name);
            let active_tasks = tasks
                .iter()
                .filter(|t| {
                    index
                        .effective_status(t)
                        .and_then(|s| StatusValue::from_alias(&s))
                        == Some(StatusValue::Active)
                })
                .count();
            let members = graph.sources_of(
                &resource.name,
                &[RelationType::ResponsibleFor, RelationType::Manages],
                Some(EntityType::TeamMember),
            );
            let usage_percentage = usage(active_tasks, tasks.len(), fields.capacity);

            ResourceUsage {
                name: resource.name.clone(),
                fields,
                tasks: tasks.iter().map(|t| t.name.clone()).collect(),
                active_tasks,
                members: members.iter().map(|m| m.name.clone()).collect(),
                usage_percentage,
                overallocated: usage_percentage > OVERALLOCATED_ABOVE,
                underutilized: !tasks.is_empty() && usage_percentage < UNDERUTILIZED_BELOW,
            }
        })
        .collect();

    let names = |pick: fn(&ResourceUsage) -> bool| {
        resources
            .iter()
            .filter(|r| pick(r))
            .map(|r| r.name.clone())
            .collect::<Vec<_>>()
    };

    Ok(ResourceAllocation {
        project: project.to_string(),
        overallocated: names(|r| r.overallocated),
        underutilized: names(|r| r.underutilized),
        resources,
    })
}

impl GraphStore {
    /// Usage of every resource in a project.
    ///
    /// # Errors
    ///
    /// - `Error::ProjectNotFound` if no project has this name
    pub async fn get_resource_allocation(&self, project: &str) -> Result<ResourceAllocation> {
        let graph = self.load().await;
        resource_allocation(&graph, project)
    }
}
