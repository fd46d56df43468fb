//! Notifications
//!
//! Engine functions never notify anyone directly. They return [`Effect`]s,
//! which the [`Tracker`](crate::app::Tracker) dispatches to a [`Notifier`]
//! once the new state has been committed.

pub mod inbox;

use serde::{Deserialize, Serialize};

pub use inbox::{Inbox, Notification, Priority};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskCompletion,
    Streak,
    Achievement,
    DailyReminder,
    Milestone,
}

impl NotificationKind {
    /// Headline shown above the message
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::TaskCompletion => "Task Completed!",
            NotificationKind::Streak => "Streak Update",
            NotificationKind::Achievement => "Achievement Unlocked!",
            NotificationKind::DailyReminder => "Daily Study Reminder",
            NotificationKind::Milestone => "Milestone Reached!",
        }
    }

    /// How prominently the notification should be shown
    pub fn priority(&self) -> Priority {
        match self {
            NotificationKind::TaskCompletion | NotificationKind::DailyReminder => Priority::Medium,
            NotificationKind::Streak
            | NotificationKind::Achievement
            | NotificationKind::Milestone => Priority::High,
        }
    }
}

/// A side effect requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Tell the user something
    Notify { kind: NotificationKind, payload: String },
}

impl Effect {
    /// Shorthand for a notify effect
    pub fn notify(kind: NotificationKind, payload: impl Into<String>) -> Self {
        Effect::Notify { kind, payload: payload.into() }
    }
}

/// Fire-and-forget notification sink
pub trait Notifier {
    /// Deliver (or queue) a notification for a user
    fn notify(&mut self, user_id: &str, kind: NotificationKind, payload: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, user_id: &str, kind: NotificationKind, payload: &str) {
        tracing::info!(user = user_id, ?kind, "{}: {}", kind.title(), payload);
    }
}
