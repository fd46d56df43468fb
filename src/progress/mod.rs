//! Per-user progress and the rules that update it

pub mod engine;
pub mod streak;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

pub use engine::{DifficultyCounts, Statistics, ToggleOutcome};
pub use streak::{StreakOutcome, StreakTransition};

/// Everything tracked for one user
#[derive(Debug, Clone, PartialEq)]
pub struct TaskData {
    /// Ids of completed roadmap and custom tasks
    pub completed_tasks: BTreeSet<String>,

    /// Free-text note per roadmap day (key is "phase-week-day")
    pub notes: BTreeMap<String, String>,

    /// Accumulated study time
    pub total_hours: f64,

    /// Consecutive active days
    pub current_streak: u32,

    /// Last day a streak check ran
    pub last_active_date: NaiveDate,

    /// Granted achievement labels (never shrinks)
    pub achievements: BTreeSet<String>,
}

impl TaskData {
    /// Fresh progress for a user signing in for the first time
    pub fn new(today: NaiveDate) -> Self {
        Self {
            completed_tasks: BTreeSet::new(),
            notes: BTreeMap::new(),
            total_hours: 0.0,
            current_streak: 0,
            last_active_date: today,
            achievements: BTreeSet::new(),
        }
    }

    /// Is this task completed?
    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed_tasks.contains(task_id)
    }

    /// Number of completed tasks
    pub fn completed_count(&self) -> usize {
        self.completed_tasks.len()
    }

    /// Note for a day, if any
    pub fn note(&self, day_key: &str) -> Option<&str> {
        self.notes.get(day_key).map(String::as_str)
    }
}

/// Clamp an hours value read from outside to a usable non-negative number
pub(crate) fn sanitize_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours >= 0.0 {
        hours
    } else {
        tracing::warn!("Discarding invalid total hours value {}", hours);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_data_is_empty() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let data = TaskData::new(today);
        assert_eq!(data.completed_count(), 0);
        assert_eq!(data.current_streak, 0);
        assert_eq!(data.last_active_date, today);
        assert!(data.achievements.is_empty());
    }

    #[test]
    fn sanitize_hours_rejects_negative_and_nan() {
        assert_eq!(sanitize_hours(2.5), 2.5);
        assert_eq!(sanitize_hours(-1.0), 0.0);
        assert_eq!(sanitize_hours(f64::NAN), 0.0);
        assert_eq!(sanitize_hours(f64::INFINITY), 0.0);
    }
}
