//! Bounded-depth dependency resolution and critical-path estimation.
//!
//! A task's neighbourhood is expanded twice from the target: once along
//! outgoing `depends_on` edges (what it needs) and once along incoming ones
//! (what needs it). Every edge found in either pass is recorded on both of
//! its endpoints, so `depends_on` and `depended_on_by` always mirror each
//! other.

use super::{GraphStore, StatusIndex};
use crate::domain::fields::TaskFields;
use crate::domain::{EntityType, KnowledgeGraph, RelationType};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Depth used when the caller does not give one.
pub const DEFAULT_DEPENDENCY_DEPTH: usize = 2;

/// One task in the resolved neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    /// Task name.
    pub name: String,
    /// Effective status.
    pub status: Option<String>,
    /// `DueDate:` field.
    pub due_date: Option<NaiveDate>,
    /// Assigned team member.
    pub assignee: Option<String>,
    /// Smallest number of hops from the target task.
    pub level: usize,
    /// Tasks this one depends on.
    pub depends_on: Vec<String>,
    /// Tasks that depend on this one.
    pub depended_on_by: Vec<String>,
}

/// Result of [`GraphStore::get_task_dependencies`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependencies {
    /// The target task.
    pub task: String,
    /// Depth bound used for the expansion.
    pub depth: usize,
    /// Every task reached, sorted by level.
    pub dependencies: Vec<DependencyNode>,
    /// Longest dependency chain among the reached tasks, prerequisites first.
    pub critical_path: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Walk {
    /// Follow `task -[depends_on]-> x`.
    Upstream,
    /// Follow `x -[depends_on]-> task`.
    Downstream,
}

#[derive(Debug, Default)]
struct NodeState {
    level: usize,
    depends_on: Vec<String>,
    depended_on_by: Vec<String>,
}

struct Resolver<'g> {
    graph: &'g KnowledgeGraph,
    depth: usize,
    nodes: HashMap<&'g str, NodeState>,
    order: Vec<&'g str>,
}

impl<'g> Resolver<'g> {
    fn new(graph: &'g KnowledgeGraph, depth: usize) -> Self {
        Self {
            graph,
            depth,
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn record(&mut self, name: &'g str, level: usize) {
        match self.nodes.get_mut(name) {
            Some(node) => node.level = node.level.min(level),
            None => {
                self.nodes.insert(
                    name,
                    NodeState {
                        level,
                        ..NodeState::default()
                    },
                );
                self.order.push(name);
            }
        }
    }

    /// Record `dependent depends_on dependency` on both nodes.
    fn link(&mut self, dependent: &str, dependency: &str) {
        if let Some(node) = self.nodes.get_mut(dependent)
            && !node.depends_on.iter().any(|n| n == dependency)
        {
            node.depends_on.push(dependency.to_string());
        }
        if let Some(node) = self.nodes.get_mut(dependency)
            && !node.depended_on_by.iter().any(|n| n == dependent)
        {
            node.depended_on_by.push(dependent.to_string());
        }
    }

    fn neighbours(&self, name: &str, direction: Walk) -> Vec<&'g str> {
        let graph = self.graph;
        graph
            .relations
            .iter()
            .filter(|r| r.relation_type == RelationType::DependsOn)
            .filter_map(|r| match direction {
                Walk::Upstream => (r.from == name).then_some(r.to.as_str()),
                Walk::Downstream => (r.to == name).then_some(r.from.as_str()),
            })
            .filter(|n| graph.entity_of_type(n, EntityType::Task).is_some())
            .collect()
    }

    fn expand(
        &mut self,
        name: &'g str,
        level: usize,
        direction: Walk,
        best: &mut HashMap<&'g str, usize>,
    ) {
        if level >= self.depth {
            return;
        }
        let next = level + 1;
        for neighbour in self.neighbours(name, direction) {
            self.record(neighbour, next);
            match direction {
                Walk::Upstream => self.link(name, neighbour),
                Walk::Downstream => self.link(neighbour, name),
            }
            if best.get(neighbour).is_none_or(|&seen| next < seen) {
                best.insert(neighbour, next);
                self.expand(neighbour, next, direction, best);
            }
        }
    }

    fn run(mut self, task: &'g str) -> Vec<(&'g str, NodeState)> {
        self.record(task, 0);
        for direction in [Walk::Upstream, Walk::Downstream] {
            let mut best = HashMap::from([(task, 0)]);
            self.expand(task, 0, direction, &mut best);
        }

        let mut nodes = self.nodes;
        let mut flat: Vec<(&str, NodeState)> = self
            .order
            .into_iter()
            .filter_map(|name| nodes.remove(name).map(|state| (name, state)))
            .collect();
        flat.sort_by_key(|(_, state)| state.level);
        flat
    }
}

/// The member a task is assigned to, in either relation direction.
pub(crate) fn assignee(graph: &KnowledgeGraph, task: &str) -> Option<String> {
    let types = [RelationType::AssignedTo];
    let member = Some(EntityType::TeamMember);
    graph
        .targets_of(task, &types, member)
        .into_iter()
        .chain(graph.sources_of(task, &types, member))
        .next()
        .map(|m| m.name.clone())
}

/// Longest simple path from a task without dependencies to a task without
/// dependents. Ties go to the path found first.
#[must_use]
pub fn critical_path(nodes: &[DependencyNode]) -> Vec<String> {
    let mut dag: DiGraph<&str, ()> = DiGraph::new();
    let index: HashMap<&str, NodeIndex> = nodes
        .iter()
        .map(|n| (n.name.as_str(), dag.add_node(n.name.as_str())))
        .collect();
    for node in nodes {
        for dependency in &node.depends_on {
            if let Some(&from) = index.get(dependency.as_str()) {
                dag.add_edge(from, index[node.name.as_str()], ());
            }
        }
    }

    let mut paths: Vec<Vec<NodeIndex>> = Vec::new();
    for source in dag.node_indices() {
        if dag.neighbors_directed(source, Direction::Incoming).next().is_some() {
            continue;
        }
        let mut path = vec![source];
        let mut on_path = HashSet::from([source]);
        walk(&dag, source, &mut path, &mut on_path, &mut paths);
    }

    paths.sort_by(|a, b| b.len().cmp(&a.len()));
    paths
        .first()
        .map(|path| path.iter().map(|&i| dag[i].to_string()).collect())
        .unwrap_or_default()
}

fn walk(
    dag: &DiGraph<&str, ()>,
    at: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    paths: &mut Vec<Vec<NodeIndex>>,
) {
    let mut next: Vec<NodeIndex> = dag.neighbors_directed(at, Direction::Outgoing).collect();
    if next.is_empty() {
        paths.push(path.clone());
        return;
    }
    next.sort_unstable();
    next.dedup();
    for n in next {
        if on_path.insert(n) {
            path.push(n);
            walk(dag, n, path, on_path, paths);
            path.pop();
            on_path.remove(&n);
        }
    }
}

/// Resolve the dependency neighbourhood of `task` up to `depth` hops.
///
/// # Errors
///
/// - `Error::TaskNotFound` if no task has this name
pub fn task_dependencies(
    graph: &KnowledgeGraph,
    task: &str,
    depth: usize,
) -> Result<TaskDependencies> {
    let target = graph
        .entity_of_type(task, EntityType::Task)
        .ok_or_else(|| Error::TaskNotFound(task.to_string()))?;

    let index = StatusIndex::build(graph);
    let dependencies: Vec<DependencyNode> = Resolver::new(graph, depth)
        .run(target.name.as_str())
        .into_iter()
        .map(|(name, state)| {
            let entity = graph.entity(name);
            DependencyNode {
                name: name.to_string(),
                status: entity.and_then(|e| index.effective_status(e)),
                due_date: entity.and_then(|e| TaskFields::from(e).due_date),
                assignee: assignee(graph, name),
                level: state.level,
                depends_on: state.depends_on,
                depended_on_by: state.depended_on_by,
            }
        })
        .collect();

    let critical_path = critical_path(&dependencies);
    debug!(task, depth, reached = dependencies.len(), ?critical_path, "Resolved dependencies");

    Ok(TaskDependencies {
        task: task.to_string(),
        depth,
        dependencies,
        critical_path,
    })
}

impl GraphStore {
    /// Dependency neighbourhood of a task and its critical path.
    ///
    /// # Errors
    ///
    /// - `Error::TaskNotFound` if no task has this name
    pub async fn get_task_dependencies(
        &self,
        task: &str,
        depth: Option<usize>,
    ) -> Result<TaskDependencies> {
        let graph = self.load().await;
        task_dependencies(&graph, task, depth.unwrap_or(DEFAULT_DEPENDENCY_DEPTH))
    }
}
