//! Content model for the roadmap
//!
//! A roadmap is a fixed nesting of phases, weeks, days and categories with
//! tasks at the leaves. Tasks are addressed by their position in that tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// How hard a task is
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// All difficulty buckets in display order
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parse a difficulty label, falling back to `Medium` for unknown labels
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            other => {
                tracing::warn!("Unknown difficulty '{}', counting it as medium", other);
                Difficulty::Medium
            }
        }
    }

    /// Lowercase label used in files and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl From<String> for Difficulty {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single roadmap task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Display text
    pub text: String,
    /// Estimated duration in minutes
    pub minutes: u32,
    /// Difficulty bucket
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A themed group of tasks within a day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category name (e.g., "Mathematics")
    pub name: String,
    /// Tasks in order
    pub tasks: Vec<Task>,
}

/// A day (or span of days) within a week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    /// Display label (e.g., "Day 1-2")
    pub label: String,
    /// Categories in order
    pub categories: Vec<Category>,
}

impl Day {
    /// Number of tasks on this day
    pub fn task_count(&self) -> usize {
        self.categories.iter().map(|c| c.tasks.len()).sum()
    }
}

/// A week within a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    /// Display title
    pub title: String,
    /// What this week concentrates on
    #[serde(default)]
    pub focus: String,
    /// Days in order
    pub days: Vec<Day>,
}

/// A phase of the roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Display title
    pub title: String,
    /// Summary of the phase
    #[serde(default)]
    pub description: String,
    /// Weeks in order
    pub weeks: Vec<Week>,
}

/// The complete roadmap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Curriculum {
    /// Phases in order
    pub phases: Vec<Phase>,
}

impl Curriculum {
    /// Create a curriculum from phases
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Total task count across the whole roadmap
    pub fn total_task_count(&self) -> usize {
        self.phases
            .iter()
            .map(|phase| {
                phase
                    .weeks
                    .iter()
                    .map(|week| week.days.iter().map(Day::task_count).sum::<usize>())
                    .sum::<usize>()
            })
            .sum()
    }

    /// Sum of estimated minutes over every task
    pub fn total_estimated_minutes(&self) -> u64 {
        self.tasks().map(|(_, task)| u64::from(task.minutes)).sum()
    }

    /// Resolve a task id (e.g., "0-1-0-2-3"); `None` for anything that does not resolve
    pub fn task_at(&self, id: &str) -> Option<&Task> {
        id.parse::<TaskPath>().ok().and_then(|path| self.task_at_path(path))
    }

    /// Resolve a parsed task path
    pub fn task_at_path(&self, path: TaskPath) -> Option<&Task> {
        self.day(path.day_key())
            .and_then(|day| day.categories.get(path.category))
            .and_then(|category| category.tasks.get(path.task))
    }

    /// Get a day by its key
    pub fn day(&self, key: DayKey) -> Option<&Day> {
        self.phases
            .get(key.phase)
            .and_then(|phase| phase.weeks.get(key.week))
            .and_then(|week| week.days.get(key.day))
    }

    /// Check that a day key string names an existing day
    pub fn has_day(&self, key: &str) -> bool {
        key.parse::<DayKey>().ok().is_some_and(|key| self.day(key).is_some())
    }

    /// Iterate every task with its path, in roadmap order
    pub fn tasks(&self) -> impl Iterator<Item = (TaskPath, &Task)> + '_ {
        self.phases.iter().enumerate().flat_map(|(p, phase)| {
            phase.weeks.iter().enumerate().flat_map(move |(w, week)| {
                week.days.iter().enumerate().flat_map(move |(d, day)| {
                    day.categories.iter().enumerate().flat_map(move |(c, category)| {
                        category.tasks.iter().enumerate().map(move |(t, task)| {
                            (TaskPath { phase: p, week: w, day: d, category: c, task: t }, task)
                        })
                    })
                })
            })
        })
    }
}

/// Split a dash-separated key into exactly `N` numeric indices
fn parse_indices<const N: usize>(s: &str) -> Option<[usize; N]> {
    let mut out = [0usize; N];
    let mut parts = s.split('-');
    for slot in out.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// Positional key of a roadmap task: phase-week-day-category-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskPath {
    pub phase: usize,
    pub week: usize,
    pub day: usize,
    pub category: usize,
    pub task: usize,
}

impl TaskPath {
    /// Key of the day this task belongs to
    pub fn day_key(&self) -> DayKey {
        DayKey { phase: self.phase, week: self.week, day: self.day }
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}-{}", self.phase, self.week, self.day, self.category, self.task)
    }
}

impl FromStr for TaskPath {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [phase, week, day, category, task] =
            parse_indices::<5>(s).ok_or_else(|| TrackerError::InvalidTaskId(s.to_string()))?;
        Ok(Self { phase, week, day, category, task })
    }
}

/// Key of a roadmap day: phase-week-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub phase: usize,
    pub week: usize,
    pub day: usize,
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.phase, self.week, self.day)
    }
}

impl FromStr for DayKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [phase, week, day] =
            parse_indices::<3>(s).ok_or_else(|| TrackerError::InvalidDayKey(s.to_string()))?;
        Ok(Self { phase, week, day })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn task(text: &str, difficulty: Difficulty) -> Task {
        Task { text: text.into(), minutes: 30, difficulty }
    }

    /// Two phases; the first has two days, the second one day
    pub(crate) fn sample_curriculum() -> Curriculum {
        let day = |label: &str, tasks: Vec<Task>| Day {
            label: label.into(),
            categories: vec![Category { name: "General".into(), tasks }],
        };
        Curriculum::new(vec![
            Phase {
                title: "Phase 1".into(),
                description: String::new(),
                weeks: vec![Week {
                    title: "Week 1".into(),
                    focus: String::new(),
                    days: vec![
                        day(
                            "Day 1",
                            vec![task("a", Difficulty::Easy), task("b", Difficulty::Hard)],
                        ),
                        day("Day 2", vec![task("c", Difficulty::Medium)]),
                    ],
                }],
            },
            Phase {
                title: "Phase 2".into(),
                description: String::new(),
                weeks: vec![Week {
                    title: "Week 1".into(),
                    focus: String::new(),
                    days: vec![day("Day 1", vec![task("d", Difficulty::Easy)])],
                }],
            },
        ])
    }

    #[test]
    fn total_task_count_folds_all_levels() {
        assert_eq!(sample_curriculum().total_task_count(), 4);
        assert_eq!(Curriculum::default().total_task_count(), 0);
    }

    #[test]
    fn task_at_resolves_valid_ids() {
        let curriculum = sample_curriculum();
        assert_eq!(curriculum.task_at("0-0-0-0-1").map(|t| t.text.as_str()), Some("b"));
        assert_eq!(curriculum.task_at("1-0-0-0-0").map(|t| t.text.as_str()), Some("d"));
    }

    #[test]
    fn task_at_rejects_bad_ids() {
        let curriculum = sample_curriculum();
        assert!(curriculum.task_at("0-0-0-0-9").is_none());
        assert!(curriculum.task_at("5-0-0-0-0").is_none());
        assert!(curriculum.task_at("0-0-x-0-0").is_none());
        assert!(curriculum.task_at("0-0-0-0").is_none());
        assert!(curriculum.task_at("0-0-0-0-0-0").is_none());
        assert!(curriculum.task_at("").is_none());
        assert!(curriculum.task_at("-1-0-0-0-0").is_none());
    }

    #[test]
    fn tasks_iterates_in_order_with_paths() {
        let curriculum = sample_curriculum();
        let ids: Vec<String> = curriculum.tasks().map(|(path, _)| path.to_string()).collect();
        assert_eq!(ids, vec!["0-0-0-0-0", "0-0-0-0-1", "0-0-1-0-0", "1-0-0-0-0"]);
    }

    #[test]
    fn task_path_round_trips_through_display() {
        let path: TaskPath = "3-2-1-0-4".parse().unwrap();
        assert_eq!(path.to_string(), "3-2-1-0-4");
        assert_eq!(path.day_key().to_string(), "3-2-1");
    }

    #[test]
    fn has_day_checks_range() {
        let curriculum = sample_curriculum();
        assert!(curriculum.has_day("0-0-1"));
        assert!(!curriculum.has_day("0-0-2"));
        assert!(!curriculum.has_day("0-0"));
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!(Difficulty::from_label("Hard"), Difficulty::Hard);
        assert_eq!(Difficulty::from_label(" easy "), Difficulty::Easy);
    }

    #[test]
    fn unknown_difficulty_defaults_to_medium() {
        let task: Task =
            serde_json::from_str(r#"{"text":"x","minutes":5,"difficulty":"Extreme"}"#).unwrap();
        assert_eq!(task.difficulty, Difficulty::Medium);
    }

    #[test]
    fn difficulty_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
    }

    #[test]
    fn total_estimated_minutes_sums_tasks() {
        assert_eq!(sample_curriculum().total_estimated_minutes(), 120);
    }
}
