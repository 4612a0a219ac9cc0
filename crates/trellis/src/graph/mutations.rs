//! In-place mutations of a loaded [`KnowledgeGraph`].
//!
//! Batch operations validate every item before touching the graph, so an
//! `Err` always means nothing was applied.

use crate::domain::{
    Entity, KnowledgeGraph, ObservationAddition, ObservationDeletion, Relation,
};
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

impl KnowledgeGraph {
    /// Append `entities`, rejecting the whole batch on any duplicate name.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateEntity` if a name exists in the graph or repeats in the batch
    pub fn create_entities(&mut self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        let mut names: HashSet<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        for entity in &entities {
            if !names.insert(entity.name.as_str()) {
                return Err(Error::DuplicateEntity(entity.name.clone()));
            }
        }

        self.entities.extend(entities.iter().cloned());
        Ok(entities)
    }

    /// Append `relations`, rejecting the whole batch on the first invalid item.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownEntity` if `from` or `to` does not exist
    /// - `Error::DuplicateRelation` if the triple exists or repeats in the batch
    pub fn create_relations(&mut self, relations: Vec<Relation>) -> Result<Vec<Relation>> {
        let names: HashSet<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();

        for (i, relation) in relations.iter().enumerate() {
            for endpoint in [&relation.from, &relation.to] {
                if !names.contains(endpoint.as_str()) {
                    return Err(Error::UnknownEntity {
                        name: endpoint.clone(),
                    });
                }
            }

            let exists = self.relations.iter().any(|r| r.same_triple(relation))
                || relations[..i].iter().any(|r| r.same_triple(relation));
            if exists {
                return Err(Error::DuplicateRelation {
                    from: relation.from.clone(),
                    to: relation.to.clone(),
                    relation_type: relation.relation_type.to_string(),
                });
            }
        }

        self.relations.extend(relations.iter().cloned());
        Ok(relations)
    }

    /// Append observations to existing entities, skipping exact duplicates.
    ///
    /// Returns what was actually added, one entry per addition.
    ///
    /// # Errors
    ///
    /// - `Error::EntityNotFound` if any target entity is missing
    pub fn add_observations(
        &mut self,
        additions: Vec<ObservationAddition>,
    ) -> Result<Vec<ObservationAddition>> {
        if let Some(missing) = additions.iter().find(|a| !self.contains(&a.entity_name)) {
            return Err(Error::EntityNotFound(missing.entity_name.clone()));
        }

        let mut added = Vec::with_capacity(additions.len());
        for addition in additions {
            let entity = self
                .entities
                .iter_mut()
                .find(|e| e.name == addition.entity_name)
                .ok_or_else(|| Error::EntityNotFound(addition.entity_name.clone()))?;

            let mut contents = Vec::new();
            for observation in addition.contents {
                if !entity.observations.contains(&observation) {
                    entity.observations.push(observation.clone());
                    contents.push(observation);
                }
            }
            added.push(ObservationAddition {
                entity_name: addition.entity_name,
                contents,
            });
        }
        Ok(added)
    }

    /// Remove entities by name and cascade to every relation touching them.
    ///
    /// Returns the number of entities removed. Unknown names are ignored.
    pub fn delete_entities(&mut self, names: &[String]) -> usize {
        let doomed: HashSet<&str> = names.iter().map(String::as_str).collect();
        let before = self.entities.len();
        self.entities.retain(|e| !doomed.contains(e.name.as_str()));
        self.relations
            .retain(|r| !doomed.contains(r.from.as_str()) && !doomed.contains(r.to.as_str()));
        let removed = before - self.entities.len();
        debug!(requested = names.len(), removed, "Deleted entities with cascade");
        removed
    }

    /// Remove observations by exact string. Unknown entities or strings are ignored.
    pub fn delete_observations(&mut self, deletions: &[ObservationDeletion]) {
        for deletion in deletions {
            if let Some(entity) = self
                .entities
                .iter_mut()
                .find(|e| e.name == deletion.entity_name)
            {
                entity
                    .observations
                    .retain(|o| !deletion.observations.contains(o));
            }
        }
    }

    /// Remove relations matching any of the given triples. Returns the number removed.
    pub fn delete_relations(&mut self, relations: &[Relation]) -> usize {
        let before = self.relations.len();
        self.relations
            .retain(|r| !relations.iter().any(|d| d.same_triple(r)));
        before - self.relations.len()
    }

    /// Replace every `Key: ...` observation of `name` with a single `Key: value`.
    ///
    /// # Errors
    ///
    /// - `Error::EntityNotFound` if `name` does not exist
    pub fn replace_field(&mut self, name: &str, key: &str, value: &str) -> Result<()> {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))?;

        entity.observations.retain(|o| {
            o.split_once(':')
                .is_none_or(|(existing, _)| existing.trim() != key)
        });
        entity.observations.push(format!("{key}: {value}"));
        Ok(())
    }

    /// Case-insensitive substring search over entities and relations.
    ///
    /// Entities match on name, type or any observation. Relations match on
    /// type or any observation and pull both endpoints into the result. The
    /// result only holds relations whose endpoints are both present.
    #[must_use]
    pub fn search(&self, query: &str) -> KnowledgeGraph {
        let needle = query.to_lowercase();
        let hit = |text: &str| text.to_lowercase().contains(&needle);

        let mut names: HashSet<&str> = self
            .entities
            .iter()
            .filter(|e| {
                hit(e.name.as_str())
                    || hit(e.entity_type.as_str())
                    || e.observations.iter().any(|o| hit(o.as_str()))
            })
            .map(|e| e.name.as_str())
            .collect();

        let matched_relations: Vec<&Relation> = self
            .relations
            .iter()
            .filter(|r| {
                hit(r.relation_type.as_str()) || r.observations.iter().any(|o| hit(o.as_str()))
            })
            .collect();
        for relation in &matched_relations {
            names.insert(relation.from.as_str());
            names.insert(relation.to.as_str());
        }

        self.subgraph(&names)
    }

    /// Entities with exactly the given names plus the relations among them.
    #[must_use]
    pub fn open(&self, names: &[String]) -> KnowledgeGraph {
        let names: HashSet<&str> = names.iter().map(String::as_str).collect();
        self.subgraph(&names)
    }

    /// The induced subgraph over `names`, in graph order.
    fn subgraph(&self, names: &HashSet<&str>) -> KnowledgeGraph {
        let entities: Vec<Entity> = self
            .entities
            .iter()
            .filter(|e| names.contains(e.name.as_str()))
            .cloned()
            .collect();
        let present: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        let relations = self
            .relations
            .iter()
            .filter(|r| present.contains(r.from.as_str()) && present.contains(r.to.as_str()))
            .cloned()
            .collect();

        KnowledgeGraph {
            entities,
            relations,
        }
    }
}
