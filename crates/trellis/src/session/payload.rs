//! Typed stage payloads.
//!
//! Callers submit free-form JSON per stage; it is decoded here into one
//! variant per stage kind. Field names are camelCase, and a few common
//! spellings are accepted as aliases.

use super::SessionStage;
use crate::error::SessionError;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accepts a JSON string or number and keeps it as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

/// `summary` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryData {
    /// What the session was about.
    pub summary: String,
    /// Project the session belongs to.
    #[serde(alias = "projectName", skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Free-text session length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// `achievements` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AchievementsData {
    /// One line per achievement.
    pub achievements: Vec<String>,
}

/// Status change for an existing task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskUpdate {
    /// Task name.
    #[serde(alias = "task", alias = "taskName")]
    pub name: String,
    /// Free-text status, resolved through the status alias table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Progress note appended as an observation.
    #[serde(alias = "notes", alias = "progress", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `taskUpdates` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskUpdatesData {
    /// Updates in submission order.
    #[serde(alias = "taskUpdates", alias = "tasks")]
    pub updates: Vec<TaskUpdate>,
}

/// A task to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewTask {
    /// Task name.
    pub name: String,
    /// Stored as a `Description:` observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text priority, resolved through the priority alias table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Free-text status; pending when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Existing task this one comes before.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedes: Option<String>,
}

/// `newTasks` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewTasksData {
    /// Tasks in submission order.
    #[serde(alias = "tasks")]
    pub new_tasks: Vec<NewTask>,
    /// Chain the tasks with `precedes` in submission order.
    pub sequential: bool,
}

/// `projectStatus` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectStatusData {
    /// Free-text status, resolved through the status alias table.
    #[serde(alias = "status", skip_serializing_if = "Option::is_none")]
    pub project_status: Option<String>,
    /// Stored as a `Status update:` observation.
    #[serde(alias = "observation", skip_serializing_if = "Option::is_none")]
    pub project_observation: Option<String>,
}

/// Update to a risk, created if it does not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskUpdate {
    /// Risk name.
    #[serde(alias = "risk")]
    pub name: String,
    /// `Description:` on creation or replacement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replaces the `Status:` observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Numeric (1-5) or verbal.
    #[serde(deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<String>,
    /// Numeric (1-5) or verbal.
    #[serde(deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    /// Replaces the `Mitigation:` observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

/// `riskUpdates` stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskUpdatesData {
    /// Updates in submission order.
    #[serde(alias = "risks")]
    pub risk_updates: Vec<RiskUpdate>,
}

/// `assembly` stage. Carries no data of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyData {}

/// One decoded stage, tagged by stage kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "data", rename_all = "camelCase")]
pub enum StagePayload {
    /// See [`SummaryData`].
    Summary(SummaryData),
    /// See [`AchievementsData`].
    Achievements(AchievementsData),
    /// See [`TaskUpdatesData`].
    TaskUpdates(TaskUpdatesData),
    /// See [`NewTasksData`].
    NewTasks(NewTasksData),
    /// See [`ProjectStatusData`].
    ProjectStatus(ProjectStatusData),
    /// See [`RiskUpdatesData`].
    RiskUpdates(RiskUpdatesData),
    /// See [`AssemblyData`].
    Assembly(AssemblyData),
    /// Completion marker appended after finalization.
    Complete,
}

fn decode<T: DeserializeOwned + Default>(stage: SessionStage, data: Value) -> Result<T, SessionError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| SessionError::InvalidStageData {
        stage: stage.to_string(),
        reason: e.to_string(),
    })
}

impl StagePayload {
    /// Decode submitted `data` for `stage`.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidStageData` if `data` does not fit the stage's shape
    /// - `SessionError::UnknownStage` for the completion marker, which cannot be submitted
    pub fn decode(stage: SessionStage, data: Value) -> Result<Self, SessionError> {
        Ok(match stage {
            SessionStage::Summary => Self::Summary(decode(stage, data)?),
            SessionStage::Achievements => Self::Achievements(decode(stage, data)?),
            SessionStage::TaskUpdates => Self::TaskUpdates(decode(stage, data)?),
            SessionStage::NewTasks => Self::NewTasks(decode(stage, data)?),
            SessionStage::ProjectStatus => Self::ProjectStatus(decode(stage, data)?),
            SessionStage::RiskUpdates => Self::RiskUpdates(decode(stage, data)?),
            SessionStage::Assembly => Self::Assembly(decode(stage, data)?),
            SessionStage::Complete => {
                return Err(SessionError::UnknownStage(stage.to_string()));
            }
        })
    }

    /// The stage kind of this payload.
    #[must_use]
    pub fn stage(&self) -> SessionStage {
        match self {
            Self::Summary(_) => SessionStage::Summary,
            Self::Achievements(_) => SessionStage::Achievements,
            Self::TaskUpdates(_) => SessionStage::TaskUpdates,
            Self::NewTasks(_) => SessionStage::NewTasks,
            Self::ProjectStatus(_) => SessionStage::ProjectStatus,
            Self::RiskUpdates(_) => SessionStage::RiskUpdates,
            Self::Assembly(_) => SessionStage::Assembly,
            Self::Complete => SessionStage::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_aliases() {
        let payload = StagePayload::decode(
            SessionStage::NewTasks,
            json!({"tasks": [{"name": "Wire", "priority": "urgent"}], "sequential": true}),
        )
        .unwrap();

        let StagePayload::NewTasks(data) = payload else {
            panic!("wrong variant");
        };
        assert!(data.sequential);
        assert_eq!(data.new_tasks[0].priority.as_deref(), Some("urgent"));
    }

    #[test]
    fn risk_levels_may_be_numbers() {
        let payload = StagePayload::decode(
            SessionStage::RiskUpdates,
            json!({"risks": [{"name": "Vendor", "likelihood": 4, "impact": "high"}]}),
        )
        .unwrap();

        let StagePayload::RiskUpdates(data) = payload else {
            panic!("wrong variant");
        };
        assert_eq!(data.risk_updates[0].likelihood.as_deref(), Some("4"));
        assert_eq!(data.risk_updates[0].impact.as_deref(), Some("high"));
    }

    #[test]
    fn null_data_is_empty_stage() {
        let payload = StagePayload::decode(SessionStage::Achievements, Value::Null).unwrap();
        assert_eq!(payload, StagePayload::Achievements(AchievementsData::default()));
    }

    #[test]
    fn wrong_shape_is_invalid_stage_data() {
        let err = StagePayload::decode(SessionStage::Achievements, json!({"achievements": 5}))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidStageData { stage, .. } if stage == "achievements"));
    }

    #[test]
    fn tagged_round_trip_keeps_stage() {
        let payload = StagePayload::Summary(SummaryData {
            summary: "x".into(),
            project: Some("P1".into()),
            duration: None,
        });
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value, json!({"stage": "summary", "data": {"summary": "x", "project": "P1"}}));
        assert_eq!(serde_json::from_value::<StagePayload>(value).unwrap(), payload);
        assert_eq!(
            serde_json::to_value(StagePayload::Complete).unwrap(),
            json!({"stage": "complete"})
        );
    }
}
