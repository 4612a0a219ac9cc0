//! Staged session workflow.
//!
//! A session collects a fixed sequence of stages, one call at a time:
//! `summary`, `achievements`, `taskUpdates`, `newTasks`, `projectStatus`,
//! `riskUpdates` and finally `assembly`. A stage may be submitted as a
//! revision of an earlier stage number, which replaces that record in place.
//! Submitting `assembly` with no further stage needed applies the session to
//! the graph in one batch and appends a `complete` marker.

pub mod finalize;
pub mod id;
pub mod payload;
pub mod store;

use crate::error::{Result, SessionError};
use crate::graph::GraphStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

pub use finalize::{FinalizationReport, apply_session};
pub use id::{SessionIdGenerator, is_session_id};
pub use payload::StagePayload;
pub use store::{InMemorySessionStore, JsonlSessionStore, SessionStore};

/// Stage kinds, in their natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStage {
    /// What the session covered and which project it belongs to.
    Summary,
    /// Things accomplished.
    Achievements,
    /// Status changes for existing tasks.
    TaskUpdates,
    /// Tasks to create.
    NewTasks,
    /// Project status change.
    ProjectStatus,
    /// Risks to create or update.
    RiskUpdates,
    /// Final stage that triggers finalization.
    Assembly,
    /// Completion marker. Cannot be submitted.
    Complete,
}

impl SessionStage {
    /// Stages a caller may submit.
    pub const SUBMITTABLE: &'static [Self] = &[
        Self::Summary,
        Self::Achievements,
        Self::TaskUpdates,
        Self::NewTasks,
        Self::ProjectStatus,
        Self::RiskUpdates,
        Self::Assembly,
    ];

    /// Wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Achievements => "achievements",
            Self::TaskUpdates => "taskUpdates",
            Self::NewTasks => "newTasks",
            Self::ProjectStatus => "projectStatus",
            Self::RiskUpdates => "riskUpdates",
            Self::Assembly => "assembly",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStage {
    type Err = SessionError;

    /// Parses a submittable stage name; `complete` is rejected.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::SUBMITTABLE
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| SessionError::UnknownStage(s.to_string()))
    }
}

/// One recorded stage of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    /// Caller-supplied stage number.
    pub stage_number: usize,
    /// Caller's free-text reasoning for the stage.
    #[serde(default)]
    pub analysis: String,
    /// `true` when the caller said no further stage is needed.
    #[serde(default)]
    pub completed: bool,
    /// Decoded stage data, tagged by stage kind.
    pub payload: StagePayload,
}

impl StageRecord {
    /// The stage kind of this record.
    #[must_use]
    pub fn stage(&self) -> SessionStage {
        self.payload.stage()
    }
}

/// One call of [`SessionWorkflow::submit_stage`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSubmission {
    /// Target session.
    pub session_id: String,
    /// Stage name, e.g. `taskUpdates`.
    pub stage: String,
    /// Caller-supplied stage number.
    #[serde(default)]
    pub stage_number: usize,
    /// Caller's free-text reasoning.
    #[serde(default)]
    pub analysis: String,
    /// Stage data; its shape depends on the stage.
    #[serde(default)]
    pub stage_data: Value,
    /// Whether another stage will follow.
    #[serde(default)]
    pub next_stage_needed: bool,
    /// Whether this replaces an earlier record.
    #[serde(default)]
    pub is_revision: bool,
    /// 1-based position of the record this one replaces.
    #[serde(default)]
    pub revises_stage: Option<usize>,
}

/// Result of a stage submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    /// Target session.
    pub session_id: String,
    /// Stage that was recorded.
    pub stage: SessionStage,
    /// Caller-supplied stage number.
    pub stage_number: usize,
    /// Stage records now held for the session, excluding the completion marker.
    pub recorded_stages: usize,
    /// Echo of the caller's flag.
    pub next_stage_needed: bool,
    /// Whether the session was finalized by this call.
    pub finalized: bool,
    /// Human-readable finalization summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// What finalization applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FinalizationReport>,
}

/// Overview of one stored session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id.
    pub session_id: String,
    /// Recorded stages, excluding the completion marker.
    pub stage_count: usize,
    /// Whether the session carries a completion marker.
    pub completed: bool,
    /// Most recently recorded stage.
    pub last_stage: Option<SessionStage>,
}

fn is_complete(stages: &[StageRecord]) -> bool {
    stages.iter().any(|r| r.stage() == SessionStage::Complete)
}

fn recorded(stages: &[StageRecord]) -> usize {
    stages
        .iter()
        .filter(|r| r.stage() != SessionStage::Complete)
        .count()
}

/// Drives sessions against a graph store and a session store.
pub struct SessionWorkflow<'a> {
    graph: &'a GraphStore,
    sessions: &'a dyn SessionStore,
}

impl<'a> SessionWorkflow<'a> {
    /// Create a workflow over `graph` and `sessions`.
    pub fn new(graph: &'a GraphStore, sessions: &'a dyn SessionStore) -> Self {
        Self { graph, sessions }
    }

    /// Create a new, empty session and return its id.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the session store cannot be read or written.
    pub async fn start_session(&self) -> Result<String> {
        let existing = self.sessions.list().await?;
        let seed = format!("{}|{}", self.graph.today(), existing.len());
        let id = SessionIdGenerator::new(existing).generate(&seed);
        self.sessions.put(&id, Vec::new()).await?;
        info!(session_id = %id, "Started session");
        Ok(id)
    }

    /// Record one stage, finalizing the session on a terminal `assembly`.
    ///
    /// # Errors
    ///
    /// - `SessionError::UnknownStage` if the stage name is not submittable
    /// - `SessionError::InvalidStageData` if the data does not fit the stage
    /// - `SessionError::NotFound` if the session does not exist
    /// - `SessionError::AlreadyCompleted` if a finished session is finalized
    ///   again or a revision targets its completion marker
    /// - IO errors from either store
    pub async fn submit_stage(&self, submission: StageSubmission) -> Result<StageOutcome> {
        let stage: SessionStage = submission.stage.parse()?;
        let payload = StagePayload::decode(stage, submission.stage_data)?;
        let id = submission.session_id;
        if !is_session_id(&id) {
            return Err(SessionError::NotFound(id).into());
        }

        let mut stages = self
            .sessions
            .get(&id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;

        let finalizing = stage == SessionStage::Assembly && !submission.next_stage_needed;
        if finalizing && is_complete(&stages) {
            return Err(SessionError::AlreadyCompleted(id).into());
        }

        let record = StageRecord {
            stage_number: submission.stage_number,
            analysis: submission.analysis,
            completed: !submission.next_stage_needed,
            payload,
        };
        let target = submission
            .revises_stage
            .filter(|_| submission.is_revision)
            .and_then(|n| n.checked_sub(1));
        if target
            .and_then(|index| stages.get(index))
            .is_some_and(|r| r.stage() == SessionStage::Complete)
        {
            return Err(SessionError::AlreadyCompleted(id).into());
        }
        match target {
            Some(index) if index < stages.len() => stages[index] = record,
            Some(index) => {
                warn!(
                    session_id = %id,
                    revises = index + 1,
                    recorded = stages.len(),
                    "Revision targets a missing stage, appending instead"
                );
                stages.push(record);
            }
            None => stages.push(record),
        }

        let mut report = None;
        if finalizing {
            let mut graph = self.graph.load().await;
            let applied = apply_session(&mut graph, &id, &stages, self.graph.today());
            if let Err(e) = self.graph.save(&graph).await {
                self.sessions.put(&id, stages).await?;
                return Err(e);
            }
            stages.push(StageRecord {
                stage_number: submission.stage_number + 1,
                analysis: String::new(),
                completed: true,
                payload: StagePayload::Complete,
            });
            report = Some(applied);
        }

        let recorded_stages = recorded(&stages);
        self.sessions.put(&id, stages).await?;

        let summary = report.as_ref().map(|r| r.describe(&id));
        if let Some(summary) = &summary {
            info!(session_id = %id, "{summary}");
        }
        Ok(StageOutcome {
            session_id: id,
            stage,
            stage_number: submission.stage_number,
            recorded_stages,
            next_stage_needed: submission.next_stage_needed,
            finalized: report.is_some(),
            summary,
            report,
        })
    }

    /// The recorded stages of one session.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotFound` if the session does not exist
    pub async fn get_session(&self, id: &str) -> Result<Vec<StageRecord>> {
        self.sessions
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()).into())
    }

    /// Every stored session with its stage count and completion state.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the session store cannot be read.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for id in self.sessions.list().await? {
            let stages = self.sessions.get(&id).await?.unwrap_or_default();
            summaries.push(SessionSummary {
                stage_count: recorded(&stages),
                completed: is_complete(&stages),
                last_stage: stages
                    .iter()
                    .rev()
                    .map(StageRecord::stage)
                    .find(|s| *s != SessionStage::Complete),
                session_id: id,
            });
        }
        Ok(summaries)
    }
}
