//! Progress snapshots for backup and transfer
//!
//! A snapshot is a self-contained JSON document. Importing one replaces the
//! user's completed tasks, achievements, notes and hours wholesale.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::{Result, TrackerError};
use crate::progress::TaskData;
use crate::progress::engine::completion_percentage;

/// Exported progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Completed task ids, sorted
    pub completed_tasks: Vec<String>,
    /// Achievement labels, sorted
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Day notes
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    /// Informational only; recomputed after import
    #[serde(default)]
    pub completion_percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
}

impl Snapshot {
    /// Capture a user's progress
    pub fn capture(curriculum: &Curriculum, data: &TaskData, now: DateTime<Utc>) -> Self {
        Self {
            completed_tasks: data.completed_tasks.iter().cloned().collect(),
            achievements: data.achievements.iter().cloned().collect(),
            notes: data.notes.clone(),
            total_hours: data.total_hours,
            export_date: now,
            completion_percentage: completion_percentage(curriculum, &data.completed_tasks),
            current_streak: Some(data.current_streak),
            last_active_date: Some(data.last_active_date),
        }
    }

    /// Parse a snapshot document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(TrackerError::Import)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and parse a snapshot file
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| TrackerError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&contents)
    }

    /// Write the snapshot as pretty JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .map_err(|source| TrackerError::Io { path: path.to_path_buf(), source })
    }

    /// Check values that parse but cannot be applied
    ///
    /// Every completed id must name a task in `curriculum` or one of
    /// `custom_task_ids`, and every note must belong to a roadmap day.
    pub fn validate(
        &self,
        curriculum: &Curriculum,
        custom_task_ids: &BTreeSet<String>,
    ) -> Result<()> {
        if !self.total_hours.is_finite() || self.total_hours < 0.0 {
            return Err(TrackerError::InvalidSnapshot(format!(
                "totalHours must be a non-negative number, got {}",
                self.total_hours
            )));
        }
        if let Some(id) = self.completed_tasks.iter().find(|id| id.trim().is_empty()) {
            return Err(TrackerError::InvalidSnapshot(format!("blank task id {:?}", id)));
        }
        let unknown = self
            .completed_tasks
            .iter()
            .find(|id| curriculum.task_at(id).is_none() && !custom_task_ids.contains(*id));
        if let Some(id) = unknown {
            return Err(TrackerError::InvalidSnapshot(format!("unknown task id {:?}", id)));
        }
        if let Some(day) = self.notes.keys().find(|day| !curriculum.has_day(day)) {
            return Err(TrackerError::InvalidSnapshot(format!("note for unknown day {:?}", day)));
        }
        Ok(())
    }

    /// Replace `data` with the snapshot contents; call [`Snapshot::validate`] first
    pub fn apply_to(self, data: &mut TaskData) {
        data.completed_tasks = self.completed_tasks.into_iter().collect();
        data.achievements = self.achievements.into_iter().collect();
        data.notes = self.notes;
        data.total_hours = self.total_hours;
        if let Some(streak) = self.current_streak {
            data.current_streak = streak;
        }
        if let Some(date) = self.last_active_date {
            data.last_active_date = date;
        }
    }
}

/// Default file name for an export made on `date`
pub fn file_name(date: NaiveDate) -> String {
    format!("roadmap-progress-{}.json", date.format("%Y-%m-%d"))
}
