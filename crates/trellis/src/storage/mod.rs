//! Persistence layer for the knowledge graph.
//!
//! The engine never keeps the graph in memory between calls. Every operation
//! loads the whole [`KnowledgeGraph`] through a [`GraphBackend`], acts on it,
//! and writes the whole graph back after mutating.
//!
//! Two backends are provided:
//!
//! - [`jsonl::JsonlGraphBackend`]: one JSON object per line, written atomically
//! - [`in_memory::InMemoryGraphBackend`]: a shared in-process snapshot, for tests
//!
//! # Concurrency
//!
//! There is no locking across a load-mutate-save sequence. Two overlapping
//! mutations that both load the same snapshot will each write a full graph,
//! and the later write wins.

pub mod in_memory;
pub mod jsonl;

use crate::domain::KnowledgeGraph;
use crate::error::Result;
use async_trait::async_trait;

pub use in_memory::InMemoryGraphBackend;
pub use jsonl::{JsonlGraphBackend, LoadWarning};

/// Whole-document storage for the knowledge graph.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Read the persisted graph.
    ///
    /// A backend with nothing persisted yet returns an empty graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage exists but cannot be read.
    async fn load(&self) -> Result<KnowledgeGraph>;

    /// Replace the persisted graph with `graph`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be written.
    async fn save(&self, graph: &KnowledgeGraph) -> Result<()>;
}
