//! Status and priority as relations to synthetic value entities.
//!
//! A subject's current status is the target of its single `has_status`
//! relation (`status:<value>`); priority works the same with `has_priority`.
//! [`StatusIndex`] is the read-side table built from those relations.

use super::GraphStore;
use crate::domain::fields::ObservationFields;
use crate::domain::{AttributeKind, Entity, KnowledgeGraph, PriorityValue, Relation, StatusValue};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// `(entity, kind) -> value` table of current attribute values.
#[derive(Debug, Default, Clone)]
pub struct StatusIndex {
    values: HashMap<(String, AttributeKind), String>,
}

impl StatusIndex {
    /// Build the index from the graph's `has_status` and `has_priority` relations.
    #[must_use]
    pub fn build(graph: &KnowledgeGraph) -> Self {
        let mut values = HashMap::new();
        for relation in &graph.relations {
            for kind in [AttributeKind::Status, AttributeKind::Priority] {
                if relation.relation_type != kind.relation_type() {
                    continue;
                }
                if let Some(value) = kind.value_of(&relation.to) {
                    values.insert((relation.from.clone(), kind), value.to_string());
                }
            }
        }
        Self { values }
    }

    /// Current value of `kind` for `name`.
    #[must_use]
    pub fn get(&self, name: &str, kind: AttributeKind) -> Option<&str> {
        self.values
            .get(&(name.to_string(), kind))
            .map(String::as_str)
    }

    /// Current status of `name`.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<&str> {
        self.get(name, AttributeKind::Status)
    }

    /// Current priority of `name`.
    #[must_use]
    pub fn priority(&self, name: &str) -> Option<&str> {
        self.get(name, AttributeKind::Priority)
    }

    /// Status used by analytics: the indexed value, else the `Status:` observation
    /// lowercased.
    #[must_use]
    pub fn effective_status(&self, entity: &Entity) -> Option<String> {
        self.status(&entity.name).map(str::to_string).or_else(|| {
            ObservationFields::parse(&entity.observations)
                .get("Status")
                .map(str::to_lowercase)
        })
    }

    /// Returns `true` if the effective status of `entity` reads as completed.
    #[must_use]
    pub fn is_completed(&self, entity: &Entity) -> bool {
        self.effective_status(entity)
            .and_then(|s| StatusValue::from_alias(&s))
            == Some(StatusValue::Completed)
    }
}

impl KnowledgeGraph {
    /// Create any missing synthetic status and priority entities.
    ///
    /// Returns the number of entities created; zero on a second call.
    pub fn ensure_attribute_entities(&mut self) -> usize {
        let mut created = 0;
        for kind in [AttributeKind::Status, AttributeKind::Priority] {
            for value in kind.values() {
                if self.ensure_attribute_entity(kind, value) {
                    created += 1;
                }
            }
        }
        created
    }

    /// Point `subject` at `status:<value>`, replacing any previous status.
    ///
    /// # Errors
    ///
    /// - `Error::EntityNotFound` if `subject` does not exist
    pub fn set_status(&mut self, subject: &str, value: StatusValue) -> Result<()> {
        self.set_attribute(subject, AttributeKind::Status, value.as_str())
    }

    /// Point `subject` at `priority:<value>`, replacing any previous priority.
    ///
    /// # Errors
    ///
    /// - `Error::EntityNotFound` if `subject` does not exist
    pub fn set_priority(&mut self, subject: &str, value: PriorityValue) -> Result<()> {
        self.set_attribute(subject, AttributeKind::Priority, value.as_str())
    }

    fn set_attribute(&mut self, subject: &str, kind: AttributeKind, value: &str) -> Result<()> {
        if !self.contains(subject) {
            return Err(Error::EntityNotFound(subject.to_string()));
        }

        self.ensure_attribute_entity(kind, value);
        let relation_type = kind.relation_type();
        self.relations
            .retain(|r| !(r.from == subject && r.relation_type == relation_type));
        self.relations
            .push(Relation::new(subject, kind.entity_name(value), relation_type));

        debug!(subject, kind = kind.prefix(), value, "Attribute set");
        Ok(())
    }

    fn ensure_attribute_entity(&mut self, kind: AttributeKind, value: &str) -> bool {
        let name = kind.entity_name(value);
        if self.contains(&name) {
            return false;
        }
        self.entities.push(
            Entity::new(name, kind.entity_type())
                .with_observations([format!("Represents the {} value {value}", kind.prefix())]),
        );
        true
    }
}

impl GraphStore {
    /// Ensure one synthetic entity per status and priority value exists.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the graph cannot be saved.
    pub async fn initialize_status_and_priority(&self) -> Result<usize> {
        let mut graph = self.load().await;
        let created = graph.ensure_attribute_entities();
        if created > 0 {
            self.save(&graph).await?;
        }
        info!(created, "Status and priority entities initialized");
        Ok(created)
    }

    /// Current status value of `name`, if any.
    pub async fn get_entity_status(&self, name: &str) -> Option<String> {
        let graph = self.load().await;
        StatusIndex::build(&graph).status(name).map(str::to_string)
    }

    /// Current priority value of `name`, if any.
    pub async fn get_entity_priority(&self, name: &str) -> Option<String> {
        let graph = self.load().await;
        StatusIndex::build(&graph).priority(name).map(str::to_string)
    }

    /// Replace the status of `name`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidStatus` if `value` is not a status value
    /// - `Error::EntityNotFound` if `name` does not exist
    pub async fn set_entity_status(&self, name: &str, value: &str) -> Result<()> {
        let value: StatusValue = value.parse()?;
        let mut graph = self.load().await;
        graph.set_status(name, value)?;
        self.save(&graph).await?;
        info!(entity = name, status = %value, "Status updated");
        Ok(())
    }

    /// Replace the priority of `name`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidPriority` if `value` is not a priority value
    /// - `Error::EntityNotFound` if `name` does not exist
    pub async fn set_entity_priority(&self, name: &str, value: &str) -> Result<()> {
        let value: PriorityValue = value.parse()?;
        let mut graph = self.load().await;
        graph.set_priority(name, value)?;
        self.save(&graph).await?;
        info!(entity = name, priority = %value, "Priority updated");
        Ok(())
    }
}
