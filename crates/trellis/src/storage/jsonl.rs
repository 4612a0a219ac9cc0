//! JSONL persistence for the knowledge graph.
//!
//! Each line is one record tagged by `type`:
//!
//! ```text
//! {"type":"entity","name":"Apollo","entityType":"project","observations":["Status: active"]}
//! {"type":"relation","from":"T1","to":"Apollo","relationType":"part_of"}
//! ```
//!
//! Entities are written before relations. Loading is resilient: lines that
//! cannot be decoded are skipped, and so are records that would break the
//! graph invariants (duplicate names, duplicate triples, relations whose
//! endpoints are missing). Every skipped record produces a [`LoadWarning`].

use super::GraphBackend;
use crate::domain::{Entity, KnowledgeGraph, Relation};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trellis_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic_iter};

/// One line of the graph file.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum GraphRecord {
    Entity(Entity),
    Relation(Relation),
}

/// Borrowed form of [`GraphRecord`] used when writing.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum GraphRecordRef<'a> {
    Entity(&'a Entity),
    Relation(&'a Relation),
}

/// Non-fatal problems found while loading a graph file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// A line could not be decoded into an entity or relation.
    ///
    /// **Effect**: the line is skipped.
    MalformedLine {
        /// 1-based line number.
        line_number: usize,
        /// Decoder message.
        error: String,
    },

    /// A second entity with an already-loaded name.
    ///
    /// **Effect**: the later entity is skipped; the first one is kept.
    DuplicateEntity {
        /// The repeated name.
        name: String,
    },

    /// A relation whose `from` or `to` entity is not in the file.
    ///
    /// **Effect**: the relation is skipped.
    OrphanedRelation {
        /// Source name.
        from: String,
        /// Target name.
        to: String,
    },

    /// A relation repeating an already-loaded (from, to, type) triple.
    ///
    /// **Effect**: the repeat is skipped.
    DuplicateRelation {
        /// Source name.
        from: String,
        /// Target name.
        to: String,
    },
}

/// File-backed graph storage using JSON Lines.
#[derive(Debug, Clone)]
pub struct JsonlGraphBackend {
    path: PathBuf,
}

impl JsonlGraphBackend {
    /// Create a backend for the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the graph file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the graph and report every record that was skipped.
    ///
    /// A missing file yields an empty graph and no warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn load_with_warnings(&self) -> Result<(KnowledgeGraph, Vec<LoadWarning>)> {
        let parsed = read_jsonl_resilient::<GraphRecord, _>(&self.path).await;
        let (records, jsonl_warnings) = match parsed {
            Ok(parsed) => parsed,
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "Graph file missing, starting empty");
                return Ok((KnowledgeGraph::default(), Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut warnings: Vec<LoadWarning> = jsonl_warnings
            .into_iter()
            .map(|w| match w {
                JsonlWarning::MalformedJson { line_number, error } => {
                    LoadWarning::MalformedLine { line_number, error }
                }
                JsonlWarning::SkippedLine {
                    line_number,
                    reason,
                } => LoadWarning::MalformedLine {
                    line_number,
                    error: reason,
                },
            })
            .collect();

        let mut graph = KnowledgeGraph::default();
        let mut names = HashSet::new();
        let mut relations = Vec::new();

        // First pass: entities, so relations may appear anywhere in the file
        for record in records {
            match record {
                GraphRecord::Entity(entity) => {
                    if names.insert(entity.name.clone()) {
                        graph.entities.push(entity);
                    } else {
                        warnings.push(LoadWarning::DuplicateEntity { name: entity.name });
                    }
                }
                GraphRecord::Relation(relation) => relations.push(relation),
            }
        }

        // Second pass: relations with endpoint and uniqueness checks
        for relation in relations {
            if !names.contains(&relation.from) || !names.contains(&relation.to) {
                warnings.push(LoadWarning::OrphanedRelation {
                    from: relation.from,
                    to: relation.to,
                });
                continue;
            }
            if graph.relations.iter().any(|r| r.same_triple(&relation)) {
                warnings.push(LoadWarning::DuplicateRelation {
                    from: relation.from,
                    to: relation.to,
                });
                continue;
            }
            graph.relations.push(relation);
        }

        Ok((graph, warnings))
    }
}

#[async_trait]
impl GraphBackend for JsonlGraphBackend {
    async fn load(&self) -> Result<KnowledgeGraph> {
        let (graph, warnings) = self.load_with_warnings().await?;
        for warning in &warnings {
            warn!(path = %self.path.display(), ?warning, "Skipped graph record");
        }
        debug!(
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "Loaded graph"
        );
        Ok(graph)
    }

    async fn save(&self, graph: &KnowledgeGraph) -> Result<()> {
        let records: Vec<GraphRecordRef<'_>> = graph
            .entities
            .iter()
            .map(GraphRecordRef::Entity)
            .chain(graph.relations.iter().map(GraphRecordRef::Relation))
            .collect();

        write_jsonl_atomic_iter(&self.path, records).await?;

        debug!(
            path = %self.path.display(),
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "Saved graph"
        );
        Ok(())
    }
}
