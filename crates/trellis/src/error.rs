//! Error types for trellis graph operations.
//!
//! Every failure falls into one of four categories (see [`ErrorKind`]).
//! Validation, not-found and conflict errors are raised before any mutation
//! is applied, so a failed call leaves the persisted graph untouched.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// The error type for trellis operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An entity type outside the closed set.
    #[error("Invalid entity type: '{0}'")]
    InvalidEntityType(String),

    /// A relation type outside the closed set.
    #[error("Invalid relation type: '{0}'")]
    InvalidRelationType(String),

    /// A status value outside the configured enumeration.
    #[error("Invalid status value: '{0}'. Valid values: active, completed, pending, blocked, cancelled")]
    InvalidStatus(String),

    /// A priority value outside the configured enumeration.
    #[error("Invalid priority value: '{0}'. Valid values: high, low")]
    InvalidPriority(String),

    /// The named entity does not exist.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// A relation endpoint does not exist.
    #[error("Unknown entity '{name}' referenced by relation")]
    UnknownEntity {
        /// Name of the missing endpoint.
        name: String,
    },

    /// No entity of type `project` with this name exists.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// No entity of type `task` with this name exists.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// No entity of type `teamMember` with this name exists.
    #[error("Team member not found: {0}")]
    TeamMemberNotFound(String),

    /// An entity with this name already exists.
    #[error("Entity already exists: {0}")]
    DuplicateEntity(String),

    /// A relation with the same (from, to, type) triple already exists.
    #[error("Relation already exists: {from} -[{relation_type}]-> {to}")]
    DuplicateRelation {
        /// Source entity name.
        from: String,
        /// Target entity name.
        to: String,
        /// Relation type name.
        relation_type: String,
    },

    /// Session problems.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<trellis_jsonl::Error> for Error {
    fn from(err: trellis_jsonl::Error) -> Self {
        match err {
            trellis_jsonl::Error::Io(e) => Self::Io(e),
            trellis_jsonl::Error::Json(e) => Self::Json(e),
        }
    }
}

/// Errors raised by the session workflow.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session id is not known to the session store.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Stage name is not one of the submittable stages.
    #[error("Unknown stage: '{0}'")]
    UnknownStage(String),

    /// Stage payload does not have the expected shape.
    #[error("Invalid data for stage '{stage}': {reason}")]
    InvalidStageData {
        /// The stage name.
        stage: String,
        /// Description of the decoding failure.
        reason: String,
    },

    /// Assembly was submitted to a session that is already finalized.
    #[error("Session already completed: {0}")]
    AlreadyCompleted(String),
}

/// Coarse error category, used to build the uniform failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected by type or value validation.
    Validation,
    /// A referenced entity or session is absent.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Persistence or configuration failure.
    Io,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEntityType(_)
            | Self::InvalidRelationType(_)
            | Self::InvalidStatus(_)
            | Self::InvalidPriority(_)
            | Self::Session(SessionError::UnknownStage(_) | SessionError::InvalidStageData { .. }) => {
                ErrorKind::Validation
            }
            Self::EntityNotFound(_)
            | Self::UnknownEntity { .. }
            | Self::ProjectNotFound(_)
            | Self::TaskNotFound(_)
            | Self::TeamMemberNotFound(_)
            | Self::Session(SessionError::NotFound(_)) => ErrorKind::NotFound,
            Self::DuplicateEntity(_)
            | Self::DuplicateRelation { .. }
            | Self::Session(SessionError::AlreadyCompleted(_)) => ErrorKind::Conflict,
            Self::Io(_) | Self::Json(_) | Self::Config(_) => ErrorKind::Io,
        }
    }

    /// Converts the error into the uniform failure payload returned to callers.
    #[must_use]
    pub fn to_failure(&self) -> Failure {
        Failure {
            success: false,
            error: self.to_string(),
            kind: self.kind(),
        }
    }
}

/// Uniform failure shape: `{ "success": false, "error": "...", "kind": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Error category.
    pub kind: ErrorKind,
}

/// A specialized Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::entity_type(Error::InvalidEntityType("widget".into()), ErrorKind::Validation)]
    #[case::status(Error::InvalidStatus("done".into()), ErrorKind::Validation)]
    #[case::stage(Error::Session(SessionError::UnknownStage("x".into())), ErrorKind::Validation)]
    #[case::unknown_entity(Error::UnknownEntity { name: "T9".into() }, ErrorKind::NotFound)]
    #[case::session(Error::Session(SessionError::NotFound("s".into())), ErrorKind::NotFound)]
    #[case::duplicate(Error::DuplicateEntity("P1".into()), ErrorKind::Conflict)]
    #[case::finalized(Error::Session(SessionError::AlreadyCompleted("s".into())), ErrorKind::Conflict)]
    #[case::config(Error::Config("bad".into()), ErrorKind::Io)]
    fn errors_map_to_categories(#[case] error: Error, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn failure_payload_carries_message() {
        let failure = Error::ProjectNotFound("Apollo".into()).to_failure();
        let json = serde_json::to_value(&failure).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Project not found: Apollo");
        assert_eq!(json["kind"], "not_found");
    }
}
