//! Progress statistics, task toggling and the achievement rule
//!
//! Everything here is pure: functions take the roadmap and the user's
//! [`TaskData`], mutate at most that data, and describe any notifications as
//! [`Effect`]s for the caller to dispatch.

use std::collections::BTreeSet;

use serde::Serialize;

use super::TaskData;
use crate::curriculum::{Curriculum, Difficulty};
use crate::notify::{Effect, NotificationKind};

/// An achievement is granted every time the completed count hits a multiple of this
pub const ACHIEVEMENT_INTERVAL: usize = 10;

/// Completion percentages that trigger a milestone notification
pub const MILESTONE_PERCENTAGES: [u8; 4] = [25, 50, 75, 100];

/// Task counts per difficulty bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyCounts {
    /// Count one more task in a bucket
    pub fn add(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    /// Count for one bucket
    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Sum over all buckets
    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

/// Aggregate numbers for the status view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Tasks in the roadmap
    pub total_tasks: usize,
    /// Completed tasks, custom ones included
    pub completed_tasks: usize,
    /// Completed tasks that are part of the roadmap
    pub curriculum_completed: usize,
    /// Roadmap completion, 0-100
    pub completion_percentage: u8,
    /// Accumulated study time
    pub total_hours: f64,
    /// Hours per completed task (0 when nothing is completed)
    pub average_task_hours: f64,
    /// Every roadmap task by difficulty
    pub tasks_by_difficulty: DifficultyCounts,
    /// Completed roadmap tasks by difficulty
    pub completed_by_difficulty: DifficultyCounts,
}

/// Result of toggling a task
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    /// The toggled task
    pub task_id: String,
    /// Whether the task is now completed
    pub completed: bool,
    /// Achievement granted by this toggle, if any
    pub achievement: Option<String>,
    /// Notifications to dispatch after committing
    pub effects: Vec<Effect>,
}

/// Number of completed ids that name a roadmap task
fn curriculum_completed(curriculum: &Curriculum, completed: &BTreeSet<String>) -> usize {
    completed.iter().filter(|id| curriculum.task_at(id).is_some()).count()
}

/// Roadmap completion as a whole percentage (half rounds up)
pub fn completion_percentage(curriculum: &Curriculum, completed: &BTreeSet<String>) -> u8 {
    let total = curriculum.total_task_count();
    if total == 0 {
        return 0;
    }
    let done = curriculum_completed(curriculum, completed);
    (100.0 * done as f64 / total as f64).round() as u8
}

/// Compute the full statistics block
pub fn statistics(curriculum: &Curriculum, data: &TaskData) -> Statistics {
    let mut tasks_by_difficulty = DifficultyCounts::default();
    let mut completed_by_difficulty = DifficultyCounts::default();

    for (path, task) in curriculum.tasks() {
        tasks_by_difficulty.add(task.difficulty);
        if data.completed_tasks.contains(&path.to_string()) {
            completed_by_difficulty.add(task.difficulty);
        }
    }

    let completed_tasks = data.completed_count();
    let average_task_hours =
        if completed_tasks > 0 { data.total_hours / completed_tasks as f64 } else { 0.0 };

    Statistics {
        total_tasks: curriculum.total_task_count(),
        completed_tasks,
        curriculum_completed: completed_by_difficulty.total(),
        completion_percentage: completion_percentage(curriculum, &data.completed_tasks),
        total_hours: data.total_hours,
        average_task_hours,
        tasks_by_difficulty,
        completed_by_difficulty,
    }
}

/// Label of the achievement granted at `count` completed tasks
pub fn achievement_label(count: usize) -> String {
    format!("Completed {} tasks!", count)
}

/// Flip a task between completed and not completed
///
/// Completing a task may grant an achievement (every [`ACHIEVEMENT_INTERVAL`]
/// completions) and a milestone notification. Un-completing never revokes
/// anything already granted.
pub fn toggle_task(curriculum: &Curriculum, data: &mut TaskData, task_id: &str) -> ToggleOutcome {
    if data.completed_tasks.remove(task_id) {
        tracing::debug!(task = task_id, "Task marked incomplete");
        return ToggleOutcome {
            task_id: task_id.to_string(),
            completed: false,
            achievement: None,
            effects: Vec::new(),
        };
    }

    let before = completion_percentage(curriculum, &data.completed_tasks);
    data.completed_tasks.insert(task_id.to_string());
    let after = completion_percentage(curriculum, &data.completed_tasks);
    tracing::debug!(task = task_id, "Task marked complete");

    let label = curriculum.task_at(task_id).map(|t| t.text.as_str()).unwrap_or(task_id);
    let mut effects = vec![Effect::notify(
        NotificationKind::TaskCompletion,
        format!("You've completed \"{}\"", label),
    )];

    let count = data.completed_count();
    let mut achievement = None;
    if count % ACHIEVEMENT_INTERVAL == 0 {
        let label = achievement_label(count);
        if data.achievements.insert(label.clone()) {
            tracing::info!("Achievement unlocked: {}", label);
            effects.push(Effect::notify(NotificationKind::Achievement, label.clone()));
            achievement = Some(label);
        }
    }

    // Only the highest milestone crossed by this toggle is announced
    if let Some(milestone) =
        MILESTONE_PERCENTAGES.iter().rev().find(|&&m| before < m && after >= m)
    {
        effects.push(Effect::notify(
            NotificationKind::Milestone,
            format!("Reached {}% of the roadmap", milestone),
        ));
    }

    ToggleOutcome { task_id: task_id.to_string(), completed: true, achievement, effects }
}

/// Store a day's note (last write wins)
pub fn set_note(data: &mut TaskData, day_key: &str, text: &str) {
    data.notes.insert(day_key.to_string(), text.to_string());
}

/// Add stopwatch time to the total, returning the new total hours
pub fn add_elapsed_seconds(data: &mut TaskData, seconds: u64) -> f64 {
    data.total_hours += seconds as f64 / 3600.0;
    data.total_hours
}
