//! Derived views computed on demand from a loaded graph.
//!
//! Each submodule exposes a pure function over `&KnowledgeGraph` plus the
//! matching async method on [`GraphStore`](crate::graph::GraphStore). Nothing
//! here mutates the graph.

pub mod decisions;
pub mod health;
pub mod milestones;
pub mod related;
pub mod resources;
pub mod risks;
pub mod team;
pub mod timeline;

pub use decisions::{DecisionEntry, DecisionLog};
pub use health::{HealthCategory, HealthFactors, HealthMetrics, ProjectHealth};
pub use milestones::{MilestoneProgress, MilestoneReport};
pub use related::{ConnectionType, RelatedProject, RelatedProjects};
pub use resources::{ResourceAllocation, ResourceUsage};
pub use risks::{RiskAssessment, RiskReport};
pub use team::{AssignedTask, TeamAssignments};
pub use timeline::{EventKind, ProjectTimeline, TimelineEvent};
