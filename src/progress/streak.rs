//! Daily streak tracking
//!
//! ```text
//! last_active == today      -> SameDay      (nothing changes)
//! last_active == today - 1  -> Consecutive  (streak + 1, notify)
//! anything else             -> Broken       (streak = 0)
//! ```
//!
//! A `last_active` date in the future (clock moved backwards) counts as
//! broken.

use chrono::NaiveDate;

use super::TaskData;
use crate::notify::{Effect, NotificationKind};

/// How the last active date relates to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    SameDay,
    Consecutive,
    Broken,
}

/// Classify `last_active` against `today`
pub fn classify(last_active: NaiveDate, today: NaiveDate) -> StreakTransition {
    if last_active == today {
        StreakTransition::SameDay
    } else if today.pred_opt() == Some(last_active) {
        StreakTransition::Consecutive
    } else {
        StreakTransition::Broken
    }
}

/// Result of a streak check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakOutcome {
    /// Which branch was taken
    pub transition: StreakTransition,
    /// Streak before the check
    pub previous: u32,
    /// Streak after the check
    pub current: u32,
    /// Notifications to dispatch after committing
    pub effects: Vec<Effect>,
}

/// Run the once-per-day streak check
///
/// Idempotent within a day: once `last_active_date` is today, further checks
/// land in `SameDay`.
pub fn check_streak(data: &mut TaskData, today: NaiveDate) -> StreakOutcome {
    let previous = data.current_streak;
    let transition = classify(data.last_active_date, today);
    let mut effects = Vec::new();

    match transition {
        StreakTransition::SameDay => {}
        StreakTransition::Consecutive => {
            data.current_streak = previous.saturating_add(1);
            data.last_active_date = today;
            tracing::debug!(streak = data.current_streak, "Streak extended");
            effects.push(Effect::notify(
                NotificationKind::Streak,
                format!("You're on a {}-day streak! Keep it up!", data.current_streak),
            ));
        }
        StreakTransition::Broken => {
            if data.last_active_date > today {
                tracing::warn!(
                    last_active = %data.last_active_date,
                    %today,
                    "Last active date is in the future; resetting streak"
                );
            } else {
                tracing::debug!(previous, "Streak broken");
            }
            data.current_streak = 0;
            data.last_active_date = today;
        }
    }

    StreakOutcome { transition, previous, current: data.current_streak, effects }
}
