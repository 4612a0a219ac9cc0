//! Domain types for the project knowledge graph.
//!
//! The graph is a flat list of uniquely named [`Entity`] nodes and directed,
//! typed [`Relation`] edges. Both type sets are closed enums; strings from the
//! outside world are converted with [`std::str::FromStr`], which rejects
//! anything outside the set.

pub mod fields;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed string enum with `as_str`, `Display`, `FromStr` and `ALL`.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $err:ident, serde = $case:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = $case)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member of the closed set, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical wire name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::$err(other.to_string())),
                }
            }
        }
    };
}

closed_enum! {
    /// Kind of an entity.
    EntityType, InvalidEntityType, serde = "camelCase" {
        /// A project.
        Project => "project",
        /// A unit of work.
        Task => "task",
        /// A dated checkpoint.
        Milestone => "milestone",
        /// Equipment, budget, tooling and so on.
        Resource => "resource",
        /// A person working on projects.
        TeamMember => "teamMember",
        /// Free-form note.
        Note => "note",
        /// A document.
        Document => "document",
        /// A problem report.
        Issue => "issue",
        /// A project risk.
        Risk => "risk",
        /// A recorded decision.
        Decision => "decision",
        /// An external dependency.
        Dependency => "dependency",
        /// A project component.
        Component => "component",
        /// A stakeholder.
        Stakeholder => "stakeholder",
        /// A change request.
        Change => "change",
        /// Synthetic status value entity.
        Status => "status",
        /// Synthetic priority value entity.
        Priority => "priority",
    }
}

closed_enum! {
    /// Kind of a relation.
    RelationType, InvalidRelationType, serde = "snake_case" {
        /// Containment, e.g. task part of project.
        PartOf => "part_of",
        /// `from` requires `to`.
        DependsOn => "depends_on",
        /// Work assignment.
        AssignedTo => "assigned_to",
        /// Authorship.
        CreatedBy => "created_by",
        /// Last modifier.
        ModifiedBy => "modified_by",
        /// Loose association.
        RelatedTo => "related_to",
        /// `from` blocks `to`.
        Blocks => "blocks",
        /// Management responsibility.
        Manages => "manages",
        /// Contribution.
        ContributesTo => "contributes_to",
        /// Documentation link.
        Documents => "documents",
        /// Scheduling link.
        ScheduledFor => "scheduled_for",
        /// Ownership.
        ResponsibleFor => "responsible_for",
        /// Reporting line.
        ReportsTo => "reports_to",
        /// Categorization.
        CategorizedAs => "categorized_as",
        /// `from` is required for `to`.
        RequiredFor => "required_for",
        /// Origin of a finding.
        DiscoveredIn => "discovered_in",
        /// Resolution link.
        ResolvedBy => "resolved_by",
        /// Impact link.
        ImpactedBy => "impacted_by",
        /// Stakeholder membership.
        StakeholderOf => "stakeholder_of",
        /// Priority classification.
        PrioritizedAs => "prioritized_as",
        /// Current status pointer.
        HasStatus => "has_status",
        /// Current priority pointer.
        HasPriority => "has_priority",
        /// Sequencing, `from` comes before `to`.
        Precedes => "precedes",
    }
}

closed_enum! {
    /// Allowed status values. One synthetic `status:<value>` entity exists per value.
    StatusValue, InvalidStatus, serde = "snake_case" {
        /// Work is underway.
        Active => "active",
        /// Work is finished.
        Completed => "completed",
        /// Work has not started.
        Pending => "pending",
        /// Work cannot proceed.
        Blocked => "blocked",
        /// Work was dropped.
        Cancelled => "cancelled",
    }
}

closed_enum! {
    /// Allowed priority values. One synthetic `priority:<value>` entity exists per value.
    PriorityValue, InvalidPriority, serde = "snake_case" {
        /// High priority.
        High => "high",
        /// Low priority.
        Low => "low",
    }
}

impl StatusValue {
    /// Maps free-text status wording onto a status value.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    #[must_use]
    pub fn from_alias(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "done" | "finished" | "complete" | "completed" | "closed" => Some(Self::Completed),
            "in progress" | "in-progress" | "in_progress" | "started" | "ongoing" | "active"
            | "wip" => Some(Self::Active),
            "todo" | "to do" | "not started" | "not_started" | "pending" | "waiting"
            | "planned" => Some(Self::Pending),
            "stuck" | "blocked" | "on hold" | "on_hold" => Some(Self::Blocked),
            "dropped" | "abandoned" | "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl PriorityValue {
    /// Maps free-text priority wording onto a priority value.
    #[must_use]
    pub fn from_alias(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "high" | "urgent" | "critical" => Some(Self::High),
            "low" | "minor" => Some(Self::Low),
            _ => None,
        }
    }
}

/// The two attribute kinds encoded as relations to synthetic entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// `has_status` → `status:<value>`.
    Status,
    /// `has_priority` → `priority:<value>`.
    Priority,
}

impl AttributeKind {
    /// Relation type used to point at the current value.
    #[must_use]
    pub fn relation_type(self) -> RelationType {
        match self {
            Self::Status => RelationType::HasStatus,
            Self::Priority => RelationType::HasPriority,
        }
    }

    /// Entity type of the synthetic value entities.
    #[must_use]
    pub fn entity_type(self) -> EntityType {
        match self {
            Self::Status => EntityType::Status,
            Self::Priority => EntityType::Priority,
        }
    }

    /// Name prefix of the synthetic value entities, without the colon.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
        }
    }

    /// Name of the synthetic entity holding `value`, e.g. `status:active`.
    #[must_use]
    pub fn entity_name(self, value: &str) -> String {
        format!("{}:{value}", self.prefix())
    }

    /// Extracts the value from a synthetic entity name, if it has this kind's prefix.
    #[must_use]
    pub fn value_of(self, entity_name: &str) -> Option<&str> {
        entity_name
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix(':'))
            .filter(|value| !value.is_empty())
    }

    /// Every configured value for this kind.
    #[must_use]
    pub fn values(self) -> Vec<&'static str> {
        match self {
            Self::Status => StatusValue::ALL.iter().map(|v| v.as_str()).collect(),
            Self::Priority => PriorityValue::ALL.iter().map(|v| v.as_str()).collect(),
        }
    }
}

/// A uniquely named, typed node carrying free-text observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique key across the whole graph.
    pub name: String,

    /// Entity kind.
    pub entity_type: EntityType,

    /// Ordered observations. `"Key: value"` lines act as typed fields.
    #[serde(default)]
    pub observations: Vec<String>,

    /// Optional embedding vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Entity {
    /// Create an entity without observations.
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            observations: Vec::new(),
            embedding: None,
        }
    }

    /// Builder-style helper that appends observations.
    #[must_use]
    pub fn with_observations<I, S>(mut self, observations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observations
            .extend(observations.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if the entity is of type `entity_type`.
    #[must_use]
    pub fn is(&self, entity_type: EntityType) -> bool {
        self.entity_type == entity_type
    }
}

/// A typed, directed edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Source entity name.
    pub from: String,

    /// Target entity name.
    pub to: String,

    /// Relation kind.
    pub relation_type: RelationType,

    /// Optional observations attached to the edge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<String>,
}

impl Relation {
    /// Create a relation without observations.
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation_type: RelationType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type,
            observations: Vec::new(),
        }
    }

    /// Returns `true` if both relations share the (from, to, type) identity.
    #[must_use]
    pub fn same_triple(&self, other: &Relation) -> bool {
        self.relation_type == other.relation_type && self.from == other.from && self.to == other.to
    }

    /// Returns `true` if `name` is either endpoint.
    #[must_use]
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// The entire persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// All entities, in insertion order.
    pub entities: Vec<Entity>,
    /// All relations, in insertion order.
    pub relations: Vec<Relation>,
}

/// Observations to append to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationAddition {
    /// Target entity.
    pub entity_name: String,
    /// Observations to add.
    pub contents: Vec<String>,
}

/// Observations to remove from one entity, by exact match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDeletion {
    /// Target entity.
    pub entity_name: String,
    /// Observations to delete.
    pub observations: Vec<String>,
}
