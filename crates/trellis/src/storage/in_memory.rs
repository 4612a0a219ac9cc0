//! In-process graph backend.
//!
//! Holds a single snapshot behind `Arc<Mutex<>>`. Clones share the snapshot,
//! so a test can keep a handle and inspect what the engine saved.

use super::GraphBackend;
use crate::domain::KnowledgeGraph;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ephemeral graph storage. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphBackend {
    graph: Arc<Mutex<KnowledgeGraph>>,
}

impl InMemoryGraphBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `graph`.
    #[must_use]
    pub fn with_graph(graph: KnowledgeGraph) -> Self {
        Self {
            graph: Arc::new(Mutex::new(graph)),
        }
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> KnowledgeGraph {
        self.graph.lock().await.clone()
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraphBackend {
    async fn load(&self) -> Result<KnowledgeGraph> {
        Ok(self.graph.lock().await.clone())
    }

    async fn save(&self, graph: &KnowledgeGraph) -> Result<()> {
        *self.graph.lock().await = graph.clone();
        Ok(())
    }
}
