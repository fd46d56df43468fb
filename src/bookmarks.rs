//! Saved learning resources

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{self, Config};
use crate::error::TrackerError;
use crate::tasks::normalize_list;

/// Kind of resource a bookmark points at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkCategory {
    Articles,
    Videos,
    Courses,
    Tools,
    Practice,
    #[default]
    Other,
}

impl BookmarkCategory {
    pub fn all() -> [BookmarkCategory; 6] {
        [
            BookmarkCategory::Articles,
            BookmarkCategory::Videos,
            BookmarkCategory::Courses,
            BookmarkCategory::Tools,
            BookmarkCategory::Practice,
            BookmarkCategory::Other,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            BookmarkCategory::Articles => "articles",
            BookmarkCategory::Videos => "videos",
            BookmarkCategory::Courses => "courses",
            BookmarkCategory::Tools => "tools",
            BookmarkCategory::Practice => "practice",
            BookmarkCategory::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BookmarkCategory::Articles => "Articles",
            BookmarkCategory::Videos => "Videos",
            BookmarkCategory::Courses => "Courses",
            BookmarkCategory::Tools => "Tools",
            BookmarkCategory::Practice => "Practice Problems",
            BookmarkCategory::Other => "Other",
        }
    }
}

impl fmt::Display for BookmarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BookmarkCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| format!("unknown bookmark category '{}'", s))
    }
}

/// A saved link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: BookmarkCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    /// Case-insensitive match on title, description or any tag
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}

/// Fields for a new bookmark
#[derive(Debug, Clone, Default)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: String,
    pub category: BookmarkCategory,
    pub tags: Vec<String>,
}

/// Changes to a bookmark; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct BookmarkUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category: Option<BookmarkCategory>,
    pub tags: Option<Vec<String>>,
}

/// All bookmarks for all local users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkStore {
    pub bookmarks: Vec<Bookmark>,
}

impl BookmarkStore {
    /// Load bookmarks from the data directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::bookmarks_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        config::load_json(path)
    }

    /// Save bookmarks to the data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::bookmarks_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json(path, self)
    }

    fn bookmarks_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("bookmarks.json"))
    }

    /// Save a new bookmark and return it
    pub fn add(&mut self, owner_id: &str, new: NewBookmark) -> &Bookmark {
        let now = Utc::now();
        self.bookmarks.push(Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: new.title.trim().to_string(),
            url: new.url.trim().to_string(),
            description: new.description,
            category: new.category,
            tags: normalize_list(new.tags),
            created_at: now,
            updated_at: now,
        });
        let index = self.bookmarks.len() - 1;
        &self.bookmarks[index]
    }

    fn owned_index(&self, owner_id: &str, id: &str) -> crate::error::Result<usize> {
        let index = self
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| TrackerError::NotFound { record: "Bookmark", id: id.to_string() })?;
        if self.bookmarks[index].owner_id != owner_id {
            return Err(TrackerError::NotOwner { record: "Bookmark", id: id.to_string() });
        }
        Ok(index)
    }

    /// Edit one of the owner's bookmarks
    pub fn update(
        &mut self,
        owner_id: &str,
        id: &str,
        update: BookmarkUpdate,
    ) -> crate::error::Result<&Bookmark> {
        let index = self.owned_index(owner_id, id)?;
        let bookmark = &mut self.bookmarks[index];
        if let Some(title) = update.title {
            bookmark.title = title.trim().to_string();
        }
        if let Some(url) = update.url {
            bookmark.url = url.trim().to_string();
        }
        if let Some(description) = update.description {
            bookmark.description = description;
        }
        if let Some(category) = update.category {
            bookmark.category = category;
        }
        if let Some(tags) = update.tags {
            bookmark.tags = normalize_list(tags);
        }
        bookmark.updated_at = Utc::now();
        Ok(&self.bookmarks[index])
    }

    /// Remove one of the owner's bookmarks
    pub fn delete(&mut self, owner_id: &str, id: &str) -> crate::error::Result<Bookmark> {
        let index = self.owned_index(owner_id, id)?;
        Ok(self.bookmarks.remove(index))
    }

    /// The user's bookmarks, newest first
    pub fn for_user(&self, owner_id: &str) -> Vec<&Bookmark> {
        let mut mine: Vec<&Bookmark> =
            self.bookmarks.iter().filter(|b| b.owner_id == owner_id).collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine
    }

    /// The user's bookmarks in one category, newest first
    pub fn by_category(&self, owner_id: &str, category: BookmarkCategory) -> Vec<&Bookmark> {
        self.for_user(owner_id).into_iter().filter(|b| b.category == category).collect()
    }

    /// The user's bookmarks matching a search term, newest first
    pub fn search(&self, owner_id: &str, term: &str) -> Vec<&Bookmark> {
        self.for_user(owner_id).into_iter().filter(|b| b.matches(term)).collect()
    }
}
