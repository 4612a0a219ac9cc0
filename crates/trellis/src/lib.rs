//! Trellis - a project knowledge graph.
//!
//! Projects, tasks, milestones, people, resources, risks and decisions are
//! stored as typed entities with free-text observations, connected by typed
//! relations. [`GraphStore`] exposes CRUD over the graph together with
//! project analytics: overviews, dependency chains and critical paths,
//! assignments, milestone progress, timelines, resource usage, risk scoring,
//! related projects, decision logs and health scores. [`SessionWorkflow`]
//! collects staged updates and applies them as one batch.

#![forbid(unsafe_code)]

pub mod analytics;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod session;
pub mod storage;

// Public CLI module (needed by binary)
pub mod app;
pub mod cli;
pub(crate) mod output;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{Entity, EntityType, KnowledgeGraph, Relation, RelationType};
pub use error::{Error, ErrorKind, Result};
pub use graph::GraphStore;
pub use session::SessionWorkflow;
pub use storage::{GraphBackend, InMemoryGraphBackend, JsonlGraphBackend};
