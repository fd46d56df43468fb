//! User-defined tasks attached to roadmap days
//!
//! Custom tasks live beside the roadmap, never inside it. Their ids start
//! with `custom-` so they can never be mistaken for a positional roadmap key.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{self, Config};
use crate::curriculum::{DayKey, Difficulty};
use crate::error::TrackerError;

/// Prefix of every custom task id
pub const CUSTOM_ID_PREFIX: &str = "custom-";

/// A task a user added to a roadmap day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTask {
    pub id: String,
    /// User who created it; only they may change it
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Links or references
    #[serde(default)]
    pub resources: Vec<String>,
    pub phase: usize,
    pub week: usize,
    pub day: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomTask {
    /// Day this task is attached to
    pub fn day_key(&self) -> DayKey {
        DayKey { phase: self.phase, week: self.week, day: self.day }
    }
}

/// Fields for a new custom task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_minutes: u32,
    pub category: String,
    pub tags: Vec<String>,
    pub resources: Vec<String>,
}

/// Changes to a custom task; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub estimated_minutes: Option<u32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
}

/// Trim entries, drop blanks and duplicates; first occurrence wins
pub(crate) fn normalize_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Is this id a custom task id?
pub fn is_custom_id(id: &str) -> bool {
    id.starts_with(CUSTOM_ID_PREFIX)
}

/// All custom tasks for all local users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomTaskStore {
    pub tasks: Vec<CustomTask>,
}

impl CustomTaskStore {
    /// Load custom tasks from the data directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::tasks_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        config::load_json(path)
    }

    /// Save custom tasks to the data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::tasks_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json(path, self)
    }

    fn tasks_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("customTasks.json"))
    }

    /// Add a task to a day and return it
    pub fn create(&mut self, owner_id: &str, day: DayKey, new: NewTask) -> &CustomTask {
        let now = Utc::now();
        let task = CustomTask {
            id: format!("{}{}", CUSTOM_ID_PREFIX, Uuid::new_v4()),
            owner_id: owner_id.to_string(),
            title: new.title.trim().to_string(),
            description: new.description,
            difficulty: new.difficulty,
            estimated_minutes: new.estimated_minutes,
            category: new.category,
            tags: normalize_list(new.tags),
            resources: normalize_list(new.resources),
            phase: day.phase,
            week: day.week,
            day: day.day,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(id = %task.id, owner = owner_id, "Custom task created");
        let index = self.tasks.len();
        self.tasks.push(task);
        &self.tasks[index]
    }

    /// Look up a task by id
    pub fn get(&self, id: &str) -> Option<&CustomTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn owned_index(&self, owner_id: &str, id: &str) -> crate::error::Result<usize> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TrackerError::NotFound { record: "Task", id: id.to_string() })?;
        if self.tasks[index].owner_id != owner_id {
            return Err(TrackerError::NotOwner { record: "Task", id: id.to_string() });
        }
        Ok(index)
    }

    /// Apply changes to one of the owner's tasks
    pub fn update(
        &mut self,
        owner_id: &str,
        id: &str,
        update: TaskUpdate,
    ) -> crate::error::Result<&CustomTask> {
        let index = self.owned_index(owner_id, id)?;
        let task = &mut self.tasks[index];

        if let Some(title) = update.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(difficulty) = update.difficulty {
            task.difficulty = difficulty;
        }
        if let Some(minutes) = update.estimated_minutes {
            task.estimated_minutes = minutes;
        }
        if let Some(category) = update.category {
            task.category = category;
        }
        if let Some(tags) = update.tags {
            task.tags = normalize_list(tags);
        }
        if let Some(resources) = update.resources {
            task.resources = normalize_list(resources);
        }
        task.updated_at = Utc::now();
        Ok(&self.tasks[index])
    }

    /// Remove one of the owner's tasks
    pub fn delete(&mut self, owner_id: &str, id: &str) -> crate::error::Result<CustomTask> {
        let index = self.owned_index(owner_id, id)?;
        tracing::debug!(id, owner = owner_id, "Custom task deleted");
        Ok(self.tasks.remove(index))
    }

    /// The owner's tasks on one day, oldest first
    pub fn for_day(&self, owner_id: &str, day: DayKey) -> Vec<&CustomTask> {
        self.tasks.iter().filter(|t| t.owner_id == owner_id && t.day_key() == day).collect()
    }

    /// Every task the user owns
    pub fn owned_by(&self, owner_id: &str) -> Vec<&CustomTask> {
        self.tasks.iter().filter(|t| t.owner_id == owner_id).collect()
    }
}
