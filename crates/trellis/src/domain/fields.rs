//! Typed views over `"Key: value"` observations.
//!
//! Observations are free text, but by convention some of them carry
//! semi-structured fields such as `Status: active` or `DueDate: 2025-03-01`.
//! [`ObservationFields`] parses those once per entity; the per-kind structs
//! below expose the fields each entity kind is expected to carry. A missing
//! or unparseable field is simply `None`.

use super::Entity;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Parsed `"Key: value"` pairs of one entity. Later observations win.
#[derive(Debug, Default)]
pub struct ObservationFields<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> ObservationFields<'a> {
    /// Parse every observation of the form `Key: value`.
    #[must_use]
    pub fn parse(observations: &'a [String]) -> Self {
        let mut values = HashMap::new();
        for observation in observations {
            if let Some((key, value)) = observation.split_once(':') {
                let key = key.trim();
                let value = value.trim();
                if !key.is_empty() && !value.is_empty() {
                    values.insert(key, value);
                }
            }
        }
        Self { values }
    }

    /// The raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.values.get(key).copied()
    }

    /// The value for `key` as an owned string.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// The value for `key` parsed as a date.
    #[must_use]
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.get(key).and_then(parse_date)
    }

    /// The value for `key` parsed as an integer.
    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Ascending date order with undated items last.
#[must_use]
pub fn cmp_dates_undated_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Fields of a `project` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    /// `Description:`
    pub description: Option<String>,
    /// `StartDate:`
    pub start_date: Option<NaiveDate>,
    /// `EndDate:`
    pub end_date: Option<NaiveDate>,
    /// `Status:`
    pub status: Option<String>,
    /// `Priority:`
    pub priority: Option<String>,
    /// `Goals:`
    pub goals: Option<String>,
}

impl From<&Entity> for ProjectFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            start_date: f.date("StartDate"),
            end_date: f.date("EndDate"),
            status: f.text("Status"),
            priority: f.text("Priority"),
            goals: f.text("Goals"),
        }
    }
}

/// Fields of a `task` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    /// `Description:`
    pub description: Option<String>,
    /// `Status:`
    pub status: Option<String>,
    /// `Priority:`
    pub priority: Option<String>,
    /// `DueDate:`
    pub due_date: Option<NaiveDate>,
    /// `Effort:`
    pub effort: Option<String>,
}

impl From<&Entity> for TaskFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            status: f.text("Status"),
            priority: f.text("Priority"),
            due_date: f.date("DueDate"),
            effort: f.text("Effort"),
        }
    }
}

/// Fields of a `milestone` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneFields {
    /// `Description:`
    pub description: Option<String>,
    /// `Date:`
    pub date: Option<NaiveDate>,
    /// `Status:`
    pub status: Option<String>,
}

impl From<&Entity> for MilestoneFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            date: f.date("Date"),
            status: f.text("Status"),
        }
    }
}

/// Fields of a `resource` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFields {
    /// `Type:`
    pub resource_type: Option<String>,
    /// `Capacity:`, when it is a positive integer.
    pub capacity: Option<u32>,
    /// `Status:`
    pub status: Option<String>,
}

impl From<&Entity> for ResourceFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            resource_type: f.text("Type"),
            capacity: f
                .integer("Capacity")
                .and_then(|c| u32::try_from(c).ok())
                .filter(|c| *c > 0),
            status: f.text("Status"),
        }
    }
}

/// Fields of a `risk` entity.
///
/// Likelihood and impact are kept as text because they may be numeric
/// (`4`) or verbal (`high`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFields {
    /// `Description:`
    pub description: Option<String>,
    /// `Likelihood:`
    pub likelihood: Option<String>,
    /// `Impact:`
    pub impact: Option<String>,
    /// `Status:`
    pub status: Option<String>,
    /// `Mitigation:`
    pub mitigation: Option<String>,
}

impl From<&Entity> for RiskFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            likelihood: f.text("Likelihood"),
            impact: f.text("Impact"),
            status: f.text("Status"),
            mitigation: f.text("Mitigation"),
        }
    }
}

/// Fields of a `decision` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionFields {
    /// `Description:`
    pub description: Option<String>,
    /// `Date:`
    pub date: Option<NaiveDate>,
    /// `Rationale:`
    pub rationale: Option<String>,
    /// `Alternatives:`
    pub alternatives: Option<String>,
    /// `Status:`
    pub status: Option<String>,
}

impl From<&Entity> for DecisionFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            date: f.date("Date"),
            rationale: f.text("Rationale"),
            alternatives: f.text("Alternatives"),
            status: f.text("Status"),
        }
    }
}

/// Fields of an `issue` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    /// `Description:`
    pub description: Option<String>,
    /// `Status:`
    pub status: Option<String>,
    /// `Priority:`
    pub priority: Option<String>,
}

impl From<&Entity> for IssueFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            description: f.text("Description"),
            status: f.text("Status"),
            priority: f.text("Priority"),
        }
    }
}

/// Fields of a `teamMember` entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFields {
    /// `Role:`
    pub role: Option<String>,
    /// `Email:`
    pub email: Option<String>,
}

impl From<&Entity> for MemberFields {
    fn from(entity: &Entity) -> Self {
        let f = ObservationFields::parse(&entity.observations);
        Self {
            role: f.text("Role"),
            email: f.text("Email"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityType;
    use rstest::rstest;

    fn observations(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn later_observation_wins() {
        let obs = observations(&["Status: pending", "note without key", "Status: active"]);
        let fields = ObservationFields::parse(&obs);

        assert_eq!(fields.get("Status"), Some("active"));
        assert_eq!(fields.get("Description"), None);
    }

    #[test]
    fn value_may_contain_colons() {
        let obs = observations(&["Date: 2025-03-01T10:00:00Z"]);
        let fields = ObservationFields::parse(&obs);

        assert_eq!(fields.date("Date"), NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[rstest]
    #[case::iso("2025-01-31", NaiveDate::from_ymd_opt(2025, 1, 31))]
    #[case::rfc3339("2025-01-31T23:00:00+00:00", NaiveDate::from_ymd_opt(2025, 1, 31))]
    #[case::padded("  2025-01-31 ", NaiveDate::from_ymd_opt(2025, 1, 31))]
    #[case::garbage("next week", None)]
    #[case::invalid_day("2025-02-30", None)]
    fn dates(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_date(input), expected);
    }

    #[test]
    fn undated_sort_last() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert_eq!(cmp_dates_undated_last(d, None), Ordering::Less);
        assert_eq!(cmp_dates_undated_last(None, d), Ordering::Greater);
        assert_eq!(cmp_dates_undated_last(None, None), Ordering::Equal);
    }

    #[rstest]
    #[case::numeric("Capacity: 4", Some(4))]
    #[case::zero("Capacity: 0", None)]
    #[case::negative("Capacity: -2", None)]
    #[case::text("Capacity: plenty", None)]
    fn resource_capacity(#[case] line: &str, #[case] expected: Option<u32>) {
        let entity = Entity::new("Rig", EntityType::Resource).with_observations([line]);
        assert_eq!(ResourceFields::from(&entity).capacity, expected);
    }

    #[test]
    fn task_fields_from_entity() {
        let entity = Entity::new("T1", EntityType::Task).with_observations([
            "Description: wire the panel",
            "DueDate: 2025-06-01",
            "Priority: high",
        ]);
        let fields = TaskFields::from(&entity);

        assert_eq!(fields.description.as_deref(), Some("wire the panel"));
        assert_eq!(fields.due_date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(fields.status, None);
    }
}
