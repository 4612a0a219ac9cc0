//! Read-only lookups over a loaded [`KnowledgeGraph`].
//!
//! All lookups are linear scans. Results preserve graph insertion order and
//! are de-duplicated by entity name.

use crate::domain::{Entity, EntityType, KnowledgeGraph, Relation, RelationType};
use std::collections::HashSet;

impl KnowledgeGraph {
    /// The entity named `name`.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// The entity named `name` if it has type `entity_type`.
    #[must_use]
    pub fn entity_of_type(&self, name: &str, entity_type: EntityType) -> Option<&Entity> {
        self.entity(name).filter(|e| e.is(entity_type))
    }

    /// Returns `true` if an entity named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    /// Every entity of type `entity_type`.
    pub fn entities_of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.is(entity_type))
    }

    /// Entities `e` with a relation `e -[t]-> target` for some `t` in `relation_types`,
    /// optionally restricted to `entity_type`.
    #[must_use]
    pub fn sources_of(
        &self,
        target: &str,
        relation_types: &[RelationType],
        entity_type: Option<EntityType>,
    ) -> Vec<&Entity> {
        self.collect_neighbours(relation_types, entity_type, |r| {
            (r.to == target).then_some(r.from.as_str())
        })
    }

    /// Entities `e` with a relation `source -[t]-> e` for some `t` in `relation_types`,
    /// optionally restricted to `entity_type`.
    #[must_use]
    pub fn targets_of(
        &self,
        source: &str,
        relation_types: &[RelationType],
        entity_type: Option<EntityType>,
    ) -> Vec<&Entity> {
        self.collect_neighbours(relation_types, entity_type, |r| {
            (r.from == source).then_some(r.to.as_str())
        })
    }

    /// Entities of `entity_type` that are `part_of` `project`.
    #[must_use]
    pub fn parts_of(&self, project: &str, entity_type: EntityType) -> Vec<&Entity> {
        self.sources_of(project, &[RelationType::PartOf], Some(entity_type))
    }

    /// Returns `true` if `from -[relation_type]-> to` exists.
    #[must_use]
    pub fn has_relation(&self, from: &str, to: &str, relation_type: RelationType) -> bool {
        self.relations
            .iter()
            .any(|r| r.relation_type == relation_type && r.from == from && r.to == to)
    }

    fn collect_neighbours<'g>(
        &'g self,
        relation_types: &[RelationType],
        entity_type: Option<EntityType>,
        endpoint: impl Fn(&'g Relation) -> Option<&'g str>,
    ) -> Vec<&'g Entity> {
        let mut seen = HashSet::new();
        self.relations
            .iter()
            .filter(|r| relation_types.contains(&r.relation_type))
            .filter_map(endpoint)
            .filter(|name| seen.insert(*name))
            .filter_map(|name| self.entity(name))
            .filter(|e| entity_type.is_none_or(|t| e.is(t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Entity, EntityType, KnowledgeGraph, Relation, RelationType};

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph {
            entities: vec![
                Entity::new("P1", EntityType::Project),
                Entity::new("T1", EntityType::Task),
                Entity::new("T2", EntityType::Task),
                Entity::new("M1", EntityType::Milestone),
                Entity::new("Alice", EntityType::TeamMember),
            ],
            relations: vec![
                Relation::new("T2", "P1", RelationType::PartOf),
                Relation::new("T1", "P1", RelationType::PartOf),
                Relation::new("M1", "P1", RelationType::PartOf),
                Relation::new("Alice", "P1", RelationType::Manages),
                Relation::new("Alice", "P1", RelationType::ContributesTo),
            ],
        }
    }

    #[test]
    fn parts_follow_relation_order_and_filter_type() {
        let g = graph();
        let names: Vec<_> = g
            .parts_of("P1", EntityType::Task)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["T2", "T1"]);
    }

    #[test]
    fn sources_are_deduplicated() {
        let g = graph();
        let team = g.sources_of(
            "P1",
            &[RelationType::Manages, RelationType::ContributesTo],
            Some(EntityType::TeamMember),
        );
        assert_eq!(team.len(), 1);
    }

    #[test]
    fn entity_of_type_checks_type() {
        let g = graph();
        assert!(g.entity_of_type("P1", EntityType::Project).is_some());
        assert!(g.entity_of_type("T1", EntityType::Project).is_none());
        assert!(g.targets_of("T1", &[RelationType::PartOf], None)[0].name == "P1");
    }
}
