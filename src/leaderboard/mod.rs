//! Leaderboard projection and ranking
//!
//! Entries are derived from each user's [`TaskData`] and recomputed after
//! every change. They are never read back as a user's own progress.

pub mod score;

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{self, Config};
use crate::progress::TaskData;

/// Most rows a category view returns
pub const CATEGORY_LIMIT: usize = 100;

/// A user's row on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// User identifier
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Completed task count
    pub completed_tasks: usize,
    /// Study hours
    pub total_hours: f64,
    /// Current streak in days
    pub streak: u32,
    /// Achievement count
    pub achievements: usize,
    /// Weighted score
    pub score: f64,
    /// When this row was recomputed
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Project a user's progress onto a leaderboard row
    pub fn project(user_id: &str, name: &str, data: &TaskData, now: DateTime<Utc>) -> Self {
        let completed_tasks = data.completed_count();
        let achievements = data.achievements.len();
        let score =
            score::score(completed_tasks, data.total_hours, data.current_streak, achievements);
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            completed_tasks,
            total_hours: data.total_hours,
            streak: data.current_streak,
            achievements,
            score,
            updated_at: now,
        }
    }

    /// The raw value a category ranks by
    pub fn value(&self, category: LeaderboardCategory) -> f64 {
        match category {
            LeaderboardCategory::Overall => self.score,
            LeaderboardCategory::Tasks => self.completed_tasks as f64,
            LeaderboardCategory::Hours => self.total_hours,
            LeaderboardCategory::Streak => f64::from(self.streak),
            LeaderboardCategory::Achievements => self.achievements as f64,
        }
    }
}

/// What a leaderboard view is sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardCategory {
    #[default]
    Overall,
    Tasks,
    Hours,
    Streak,
    Achievements,
}

impl LeaderboardCategory {
    /// Every category in display order
    pub fn all() -> [LeaderboardCategory; 5] {
        [
            LeaderboardCategory::Overall,
            LeaderboardCategory::Tasks,
            LeaderboardCategory::Hours,
            LeaderboardCategory::Streak,
            LeaderboardCategory::Achievements,
        ]
    }

    /// Identifier used on the command line
    pub fn id(&self) -> &'static str {
        match self {
            LeaderboardCategory::Overall => "overall",
            LeaderboardCategory::Tasks => "tasks",
            LeaderboardCategory::Hours => "hours",
            LeaderboardCategory::Streak => "streak",
            LeaderboardCategory::Achievements => "achievements",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            LeaderboardCategory::Overall => "Overall",
            LeaderboardCategory::Tasks => "Tasks Completed",
            LeaderboardCategory::Hours => "Hours Spent",
            LeaderboardCategory::Streak => "Current Streak",
            LeaderboardCategory::Achievements => "Achievements",
        }
    }
}

impl fmt::Display for LeaderboardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LeaderboardCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.id() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown leaderboard category '{}'", s))
    }
}

/// A ranked row
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<'a> {
    /// 1-based rank
    pub rank: usize,
    /// The row
    pub entry: &'a LeaderboardEntry,
}

/// All leaderboard rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    /// One row per user
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Load the leaderboard from the data directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::leaderboard_path()?)
    }

    /// Load the leaderboard from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        config::load_json(path)
    }

    /// Save the leaderboard to the data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::leaderboard_path()?)
    }

    /// Save the leaderboard to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json(path, self)
    }

    fn leaderboard_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("leaderboard.json"))
    }

    /// Add or replace a user's row
    pub fn upsert(&mut self, entry: LeaderboardEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.user_id == entry.user_id) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Rows sorted by a category, best first; ties go to the lower user id
    fn sorted(&self, category: LeaderboardCategory) -> Vec<&LeaderboardEntry> {
        let mut rows: Vec<&LeaderboardEntry> = self.entries.iter().collect();
        rows.sort_by(|a, b| {
            b.value(category)
                .partial_cmp(&a.value(category))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        rows
    }

    /// Highest scores, at most `limit`
    pub fn top(&self, limit: usize) -> Vec<&LeaderboardEntry> {
        let mut rows = self.sorted(LeaderboardCategory::Overall);
        rows.truncate(limit);
        rows
    }

    /// 1-based overall rank of a user
    pub fn rank(&self, user_id: &str) -> Option<usize> {
        self.sorted(LeaderboardCategory::Overall)
            .iter()
            .position(|e| e.user_id == user_id)
            .map(|i| i + 1)
    }

    /// Ranked rows for one category, at most `limit` (capped at [`CATEGORY_LIMIT`])
    pub fn by_category(&self, category: LeaderboardCategory, limit: usize) -> Vec<RankedEntry<'_>> {
        self.sorted(category)
            .into_iter()
            .take(limit.min(CATEGORY_LIMIT))
            .enumerate()
            .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(user_id: &str, tasks: usize, hours: f64, streak: u32) -> LeaderboardEntry {
        let mut data = TaskData::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        data.completed_tasks = (0..tasks).map(|i| format!("0-0-0-0-{}", i)).collect();
        data.total_hours = hours;
        data.current_streak = streak;
        LeaderboardEntry::project(user_id, user_id, &data, Utc::now())
    }

    fn ids(rows: &[&LeaderboardEntry]) -> Vec<String> {
        rows.iter().map(|e| e.user_id.clone()).collect()
    }

    #[test]
    fn projection_computes_score() {
        let row = entry("ada", 2, 1.0, 3);
        assert_eq!(row.score, 20.0 + 5.0 + 6.0);
        assert_eq!(row.completed_tasks, 2);
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 1, 0.0, 0));
        board.upsert(entry("ada", 5, 0.0, 0));
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].completed_tasks, 5);
    }

    #[test]
    fn top_sorts_by_score_and_limits() {
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 1, 0.0, 0));
        board.upsert(entry("bob", 3, 0.0, 0));
        board.upsert(entry("cy", 2, 0.0, 0));

        assert_eq!(ids(&board.top(2)), vec!["bob", "cy"]);
    }

    #[test]
    fn ties_break_by_user_id() {
        let mut board = Leaderboard::default();
        board.upsert(entry("zed", 1, 0.0, 0));
        board.upsert(entry("amy", 1, 0.0, 0));
        assert_eq!(ids(&board.top(10)), vec!["amy", "zed"]);
    }

    #[test]
    fn rank_is_one_based_and_optional() {
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 1, 0.0, 0));
        board.upsert(entry("bob", 3, 0.0, 0));
        assert_eq!(board.rank("bob"), Some(1));
        assert_eq!(board.rank("ada"), Some(2));
        assert_eq!(board.rank("nobody"), None);
    }

    #[test]
    fn category_views_sort_by_raw_field() {
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 5, 0.0, 1));
        board.upsert(entry("bob", 1, 0.0, 9));

        let streak = board.by_category(LeaderboardCategory::Streak, CATEGORY_LIMIT);
        assert_eq!(streak[0].entry.user_id, "bob");
        assert_eq!(streak[0].rank, 1);
        assert_eq!(streak[1].rank, 2);

        let tasks = board.by_category(LeaderboardCategory::Tasks, 1);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].entry.user_id, "ada");
    }

    #[test]
    fn category_views_never_exceed_the_cap() {
        let mut board = Leaderboard::default();
        for i in 0..CATEGORY_LIMIT + 5 {
            board.upsert(entry(&format!("user-{:03}", i), 1, 0.0, 0));
        }
        let rows = board.by_category(LeaderboardCategory::Overall, usize::MAX);
        assert_eq!(rows.len(), CATEGORY_LIMIT);
        assert_eq!(rows.last().map(|r| r.rank), Some(CATEGORY_LIMIT));
    }

    #[test]
    fn category_parses_from_id() {
        assert_eq!("hours".parse::<LeaderboardCategory>(), Ok(LeaderboardCategory::Hours));
        assert_eq!(" Overall ".parse::<LeaderboardCategory>(), Ok(LeaderboardCategory::Overall));
        assert!("speed".parse::<LeaderboardCategory>().is_err());
    }

    #[test]
    fn leaderboard_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 2, 1.5, 1));
        board.save_to(&path).unwrap();

        let loaded = Leaderboard::load_from(&path).unwrap();
        assert_eq!(loaded.entries, board.entries);
    }
}
