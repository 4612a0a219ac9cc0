//! The graph engine: CRUD, search, status index and derived views.
//!
//! [`GraphStore`] is the entry point. It owns a [`GraphBackend`] and a
//! [`Clock`], and implements every public operation as
//! load → validate → mutate → save. Validation always completes before the
//! first mutation, so a rejected call leaves the persisted graph untouched.
//!
//! The pure graph logic lives on [`KnowledgeGraph`] itself (see
//! [`mutations`] and [`query`]) so that batch callers such as session
//! finalization can apply many changes to one loaded snapshot and save once.

pub mod dependencies;
pub mod mutations;
pub mod overview;
pub mod query;
pub mod status;

use crate::clock::{Clock, SystemClock};
use crate::domain::{
    Entity, KnowledgeGraph, ObservationAddition, ObservationDeletion, Relation,
};
use crate::error::Result;
use crate::storage::GraphBackend;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

pub use status::StatusIndex;

/// Query and mutation API over a persisted knowledge graph.
pub struct GraphStore {
    backend: Box<dyn GraphBackend>,
    clock: Arc<dyn Clock>,
    upcoming_window_days: i64,
}

/// Default look-ahead, in days, for "upcoming" due dates.
pub const DEFAULT_UPCOMING_WINDOW_DAYS: i64 = 7;

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("backend", &"<dyn GraphBackend>")
            .field("today", &self.today())
            .finish()
    }
}

impl GraphStore {
    /// Create a store over `backend`, using the system clock.
    pub fn new(backend: impl GraphBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            clock: Arc::new(SystemClock),
            upcoming_window_days: DEFAULT_UPCOMING_WINDOW_DAYS,
        }
    }

    /// Replace the clock used for date-relative analytics.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the look-ahead used for upcoming due dates.
    #[must_use]
    pub fn with_upcoming_window(mut self, days: i64) -> Self {
        self.upcoming_window_days = days;
        self
    }

    /// Look-ahead, in days, used for upcoming due dates.
    #[must_use]
    pub fn upcoming_window_days(&self) -> i64 {
        self.upcoming_window_days
    }

    /// Today's date according to the store's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load the persisted graph.
    ///
    /// Never fails: an unreadable backend is logged and treated as empty.
    pub async fn load(&self) -> KnowledgeGraph {
        match self.backend.load().await {
            Ok(graph) => graph,
            Err(e) => {
                warn!(error = %e, "Failed to load graph, using empty graph");
                KnowledgeGraph::default()
            }
        }
    }

    /// Persist `graph`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the backend cannot write.
    pub async fn save(&self, graph: &KnowledgeGraph) -> Result<()> {
        self.backend.save(graph).await
    }

    /// The whole graph.
    pub async fn read_graph(&self) -> KnowledgeGraph {
        self.load().await
    }

    /// Create entities. The whole batch is rejected if any item is invalid.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateEntity` if a name already exists or repeats within the batch
    pub async fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        let mut graph = self.load().await;
        let created = graph.create_entities(entities)?;
        self.save(&graph).await?;
        info!(count = created.len(), "Created entities");
        Ok(created)
    }

    /// Create relations. The whole batch is rejected if any item is invalid.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownEntity` if an endpoint does not exist
    /// - `Error::DuplicateRelation` if a triple already exists or repeats within the batch
    pub async fn create_relations(&self, relations: Vec<Relation>) -> Result<Vec<Relation>> {
        let mut graph = self.load().await;
        let created = graph.create_relations(relations)?;
        self.save(&graph).await?;
        info!(count = created.len(), "Created relations");
        Ok(created)
    }

    /// Append observations to existing entities.
    ///
    /// Returns, per entity, the observations that were actually added.
    ///
    /// # Errors
    ///
    /// - `Error::EntityNotFound` if any target entity is missing
    pub async fn add_observations(
        &self,
        additions: Vec<ObservationAddition>,
    ) -> Result<Vec<ObservationAddition>> {
        let mut graph = self.load().await;
        let added = graph.add_observations(additions)?;
        self.save(&graph).await?;
        Ok(added)
    }

    /// Delete entities and every relation touching them. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the graph cannot be saved.
    pub async fn delete_entities(&self, names: &[String]) -> Result<()> {
        let mut graph = self.load().await;
        let removed = graph.delete_entities(names);
        self.save(&graph).await?;
        info!(count = removed, "Deleted entities");
        Ok(())
    }

    /// Delete observations by exact match. Unknown entities or strings are ignored.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the graph cannot be saved.
    pub async fn delete_observations(&self, deletions: &[ObservationDeletion]) -> Result<()> {
        let mut graph = self.load().await;
        graph.delete_observations(deletions);
        self.save(&graph).await
    }

    /// Delete relations matching the given (from, to, type) triples.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the graph cannot be saved.
    pub async fn delete_relations(&self, relations: &[Relation]) -> Result<()> {
        let mut graph = self.load().await;
        let removed = graph.delete_relations(relations);
        self.save(&graph).await?;
        info!(count = removed, "Deleted relations");
        Ok(())
    }

    /// Case-insensitive substring search returning a self-consistent subgraph.
    pub async fn search_nodes(&self, query: &str) -> KnowledgeGraph {
        self.load().await.search(query)
    }

    /// Exact-name lookup plus the relations among the named entities.
    pub async fn open_nodes(&self, names: &[String]) -> KnowledgeGraph {
        self.load().await.open(names)
    }
}
