//! Notification inbox persistence

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NotificationKind, Notifier};
use crate::config::{self, Config};

/// Number of notifications shown by default
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Notifications kept per user; older ones are pruned, read ones first
pub const MAX_PER_USER: usize = 100;

/// Display priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Medium,
    High,
}

/// A stored notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: String,
    /// Recipient
    pub user_id: String,
    /// What happened
    pub kind: NotificationKind,
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Display priority
    pub priority: Priority,
    /// Has the user seen it?
    pub read: bool,
    /// When it was created
    pub created_at: DateTime<Utc>,
    /// When it was marked read
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Create an unread notification with the kind's title and priority
    pub fn new(user_id: &str, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            title: kind.title().to_string(),
            message: message.into(),
            priority: kind.priority(),
            read: false,
            created_at: Utc::now(),
            read_at: None,
        }
    }
}

/// All notifications for all local users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inbox {
    /// Notifications in creation order
    pub notifications: Vec<Notification>,
}

impl Inbox {
    /// Load the inbox from the data directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::inbox_path()?)
    }

    /// Load the inbox from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        config::load_json(path)
    }

    /// Save the inbox to the data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::inbox_path()?)
    }

    /// Save the inbox to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json(path, self)
    }

    /// Get path to notifications.json
    fn inbox_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("notifications.json"))
    }

    /// Add a notification and return its id
    pub fn create(&mut self, user_id: &str, kind: NotificationKind, message: &str) -> String {
        let notification = Notification::new(user_id, kind, message);
        let id = notification.id.clone();
        self.notifications.push(notification);
        self.prune(user_id);
        id
    }

    /// Drop the user's oldest notifications beyond [`MAX_PER_USER`]
    fn prune(&mut self, user_id: &str) {
        let mine = self.notifications.iter().filter(|n| n.user_id == user_id).count();
        let mut excess = mine.saturating_sub(MAX_PER_USER);
        if excess == 0 {
            return;
        }
        tracing::debug!(user = user_id, excess, "Pruning old notifications");

        // Stored in creation order, so the first matches are the oldest
        for read in [true, false] {
            self.notifications.retain(|n| {
                if excess > 0 && n.user_id == user_id && n.read == read {
                    excess -= 1;
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Newest notifications for a user, at most `limit`
    pub fn recent(&self, user_id: &str, limit: usize) -> Vec<&Notification> {
        let mut mine: Vec<&Notification> =
            self.notifications.iter().filter(|n| n.user_id == user_id).collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit);
        mine
    }

    /// Count unread notifications for a user
    pub fn unread_count(&self, user_id: &str) -> usize {
        self.notifications.iter().filter(|n| n.user_id == user_id && !n.read).count()
    }

    /// Mark one of the user's notifications read
    pub fn mark_read(&mut self, user_id: &str, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(notification) => {
                if !notification.read {
                    notification.read = true;
                    notification.read_at = Some(Utc::now());
                }
                true
            }
            None => false,
        }
    }

    /// Mark every notification for a user read, returning how many changed
    pub fn mark_all_read(&mut self, user_id: &str) -> usize {
        let now = Utc::now();
        let mut changed = 0;
        for n in self.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            n.read = true;
            n.read_at = Some(now);
            changed += 1;
        }
        changed
    }

    /// Delete one of the user's notifications
    pub fn delete(&mut self, user_id: &str, id: &str) -> bool {
        let len_before = self.notifications.len();
        self.notifications.retain(|n| !(n.id == id && n.user_id == user_id));
        self.notifications.len() < len_before
    }
}

impl Notifier for Inbox {
    fn notify(&mut self, user_id: &str, kind: NotificationKind, payload: &str) {
        tracing::debug!(user = user_id, ?kind, "Queued notification");
        self.create(user_id, kind, payload);
    }
}
