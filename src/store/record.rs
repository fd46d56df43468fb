//! Stored form of a user's progress
//!
//! Records cross the I/O boundary, so they are validated when converted into
//! [`TaskData`] and never used by the engine directly.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::{TaskData, sanitize_hours};

/// A user's progress document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub completed_tasks: Vec<String>,
    pub notes: BTreeMap<String, String>,
    pub total_hours: f64,
    pub current_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub achievements: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A partial update; only present fields are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
}

/// Fields of a progress record, used to track unsynced changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CompletedTasks,
    Notes,
    TotalHours,
    CurrentStreak,
    LastActiveDate,
    Achievements,
}

impl ProgressPatch {
    /// Patch carrying every field of `data`
    pub fn full(data: &TaskData) -> Self {
        Self::from_fields(
            data,
            &[
                Field::CompletedTasks,
                Field::Notes,
                Field::TotalHours,
                Field::CurrentStreak,
                Field::LastActiveDate,
                Field::Achievements,
            ],
        )
    }

    /// Patch carrying the listed fields of `data`
    pub fn from_fields(data: &TaskData, fields: &[Field]) -> Self {
        let mut patch = Self::default();
        for field in fields {
            match field {
                Field::CompletedTasks => {
                    patch.completed_tasks = Some(data.completed_tasks.iter().cloned().collect())
                }
                Field::Notes => patch.notes = Some(data.notes.clone()),
                Field::TotalHours => patch.total_hours = Some(data.total_hours),
                Field::CurrentStreak => patch.current_streak = Some(data.current_streak),
                Field::LastActiveDate => patch.last_active_date = Some(data.last_active_date),
                Field::Achievements => {
                    patch.achievements = Some(data.achievements.iter().cloned().collect())
                }
            }
        }
        patch
    }

    /// Fields present in this patch
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.completed_tasks.is_some() {
            fields.push(Field::CompletedTasks);
        }
        if self.notes.is_some() {
            fields.push(Field::Notes);
        }
        if self.total_hours.is_some() {
            fields.push(Field::TotalHours);
        }
        if self.current_streak.is_some() {
            fields.push(Field::CurrentStreak);
        }
        if self.last_active_date.is_some() {
            fields.push(Field::LastActiveDate);
        }
        if self.achievements.is_some() {
            fields.push(Field::Achievements);
        }
        fields
    }

    /// Does this patch carry nothing?
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Combine with a newer patch; fields in `newer` win
    pub fn absorb(&mut self, newer: ProgressPatch) {
        if newer.completed_tasks.is_some() {
            self.completed_tasks = newer.completed_tasks;
        }
        if newer.notes.is_some() {
            self.notes = newer.notes;
        }
        if newer.total_hours.is_some() {
            self.total_hours = newer.total_hours;
        }
        if newer.current_streak.is_some() {
            self.current_streak = newer.current_streak;
        }
        if newer.last_active_date.is_some() {
            self.last_active_date = newer.last_active_date;
        }
        if newer.achievements.is_some() {
            self.achievements = newer.achievements;
        }
    }
}

impl ProgressRecord {
    /// Apply a patch (merge semantics: absent fields are kept)
    pub fn merge(&mut self, patch: ProgressPatch) {
        if let Some(completed) = patch.completed_tasks {
            self.completed_tasks = completed;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(hours) = patch.total_hours {
            self.total_hours = hours;
        }
        if let Some(streak) = patch.current_streak {
            self.current_streak = streak;
        }
        if let Some(date) = patch.last_active_date {
            self.last_active_date = Some(date);
        }
        if let Some(achievements) = patch.achievements {
            self.achievements = achievements;
        }
        self.last_updated = Some(Utc::now());
    }
}

impl TaskData {
    /// Validate a stored record; a missing last-active date becomes `today`
    pub fn from_record(record: ProgressRecord, today: NaiveDate) -> Self {
        Self {
            completed_tasks: record.completed_tasks.into_iter().collect::<BTreeSet<_>>(),
            notes: record.notes,
            total_hours: sanitize_hours(record.total_hours),
            current_streak: record.current_streak,
            last_active_date: record.last_active_date.unwrap_or(today),
            achievements: record.achievements.into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn record_uses_camel_case() {
        let json = serde_json::to_string(&ProgressRecord::default()).unwrap();
        assert!(json.contains("completedTasks"));
        assert!(json.contains("lastActiveDate"));
    }

    #[test]
    fn from_record_dedupes_and_sanitizes() {
        let record = ProgressRecord {
            completed_tasks: vec!["a".into(), "a".into(), "b".into()],
            achievements: vec!["x".into(), "x".into()],
            total_hours: -3.0,
            ..Default::default()
        };

        let data = TaskData::from_record(record, today());

        assert_eq!(data.completed_count(), 2);
        assert_eq!(data.achievements.len(), 1);
        assert_eq!(data.total_hours, 0.0);
        assert_eq!(data.last_active_date, today());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let record: ProgressRecord = serde_json::from_str(r#"{"totalHours": 2.5}"#).unwrap();
        assert_eq!(record.total_hours, 2.5);
        assert!(record.completed_tasks.is_empty());
        assert!(record.last_active_date.is_none());
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let mut record = ProgressRecord {
            current_streak: 4,
            notes: [("0-0-0".into(), "hi".into())].into(),
            ..Default::default()
        };
        record.merge(ProgressPatch { current_streak: Some(5), ..Default::default() });

        assert_eq!(record.current_streak, 5);
        assert_eq!(record.notes.get("0-0-0").map(String::as_str), Some("hi"));
        assert!(record.last_updated.is_some());
    }

    #[test]
    fn patch_serialization_skips_absent_fields() {
        let patch = ProgressPatch { total_hours: Some(1.0), ..Default::default() };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"totalHours":1.0}"#);
    }

    #[test]
    fn absorb_prefers_newer_fields() {
        let mut older = ProgressPatch {
            total_hours: Some(1.0),
            current_streak: Some(2),
            ..Default::default()
        };
        older.absorb(ProgressPatch { total_hours: Some(3.0), ..Default::default() });
        assert_eq!(older.total_hours, Some(3.0));
        assert_eq!(older.current_streak, Some(2));
        assert_eq!(older.fields(), vec![Field::TotalHours, Field::CurrentStreak]);
    }

    #[test]
    fn full_patch_round_trips_task_data() {
        let mut data = TaskData::new(today());
        data.completed_tasks.insert("0-0-0-0-1".into());
        data.achievements.insert("Completed 10 tasks!".into());
        data.total_hours = 1.25;

        let mut record = ProgressRecord::default();
        record.merge(ProgressPatch::full(&data));

        assert_eq!(TaskData::from_record(record, today()), data);
    }
}
