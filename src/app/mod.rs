//! Session controller
//!
//! [`Tracker`] owns one user's progress for the length of a session. Every
//! mutation follows the same order: validate, update [`TaskData`], persist
//! the changed fields, then dispatch notifications.

pub mod command;

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::User;
use crate::config::Config;
use crate::curriculum::Curriculum;
use crate::error::{Result, TrackerError};
use crate::export::Snapshot;
use crate::leaderboard::LeaderboardEntry;
use crate::notify::{Effect, NotificationKind, Notifier};
use crate::progress::{StreakOutcome, StreakTransition, TaskData, ToggleOutcome, engine, streak};
use crate::stopwatch::StoppedSession;
use crate::store::{Field, ProgressPatch, ProgressRecord, ProgressStore};
use crate::tasks::is_custom_id;

/// Message of the daily reminder
pub const DAILY_REMINDER: &str = "Don't forget to study today! Keep your streak going.";

/// Behaviour switches for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Add stopped stopwatch time to total hours
    pub fold_elapsed_on_stop: bool,
    /// Remind when nothing has happened yet today
    pub daily_reminders: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { fold_elapsed_on_stop: true, daily_reminders: true }
    }
}

impl From<&Config> for Options {
    fn from(config: &Config) -> Self {
        Self {
            fold_elapsed_on_stop: config.fold_elapsed_on_stop,
            daily_reminders: config.daily_reminders,
        }
    }
}

/// One user's session
pub struct Tracker<'a, S, N> {
    curriculum: &'a Curriculum,
    user: User,
    data: TaskData,
    store: S,
    notifier: N,
    options: Options,
    /// Ids of the user's custom tasks, which may be toggled like roadmap tasks
    custom_task_ids: BTreeSet<String>,
    /// Changed fields not yet accepted by the store
    pending: ProgressPatch,
    last_sync_error: Option<String>,
    longest_streak: u32,
}

impl<'a, S: ProgressStore, N: Notifier> Tracker<'a, S, N> {
    /// Load the user's progress, creating it on first use
    pub fn open(
        curriculum: &'a Curriculum,
        user: User,
        store: S,
        notifier: N,
        options: Options,
        today: NaiveDate,
    ) -> Result<Self> {
        let existing = store.get(&user.id)?;
        let first_session = existing.is_none();
        let data = match existing {
            Some(record) => TaskData::from_record(record, today),
            None => {
                tracing::info!(user = %user.id, "Creating progress for new user");
                TaskData::new(today)
            }
        };

        let mut tracker = Self {
            curriculum,
            longest_streak: data.current_streak,
            user,
            data,
            store,
            notifier,
            options,
            custom_task_ids: BTreeSet::new(),
            pending: ProgressPatch::default(),
            last_sync_error: None,
        };
        if first_session {
            tracker.pending = ProgressPatch::full(&tracker.data);
            tracker.flush();
        }
        Ok(tracker)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn data(&self) -> &TaskData {
        &self.data
    }

    pub fn curriculum(&self) -> &'a Curriculum {
        self.curriculum
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Give the notifier back, ending the session
    pub fn into_notifier(self) -> N {
        self.notifier
    }

    /// Allow toggling these custom task ids; ids without the custom prefix are ignored
    pub fn register_custom_tasks<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            if is_custom_id(&id) {
                self.custom_task_ids.insert(id);
            } else {
                tracing::warn!(task = %id, "Ignoring custom task id without the custom prefix");
            }
        }
    }

    /// Longest streak seen during this session
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    /// Error from the last failed write, cleared by the next successful one
    pub fn last_sync_error(&self) -> Option<&str> {
        self.last_sync_error.as_deref()
    }

    /// Are there changes the store has not accepted yet?
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Complete or un-complete a roadmap or custom task
    ///
    /// Completed ids can always be un-completed, even once they no longer
    /// resolve (a deleted custom task or an edited roadmap).
    pub fn toggle_task(&mut self, task_id: &str) -> Result<ToggleOutcome> {
        let known = self.data.is_completed(task_id)
            || self.curriculum.task_at(task_id).is_some()
            || self.custom_task_ids.contains(task_id);
        if !known {
            return Err(TrackerError::InvalidTaskId(task_id.to_string()));
        }

        let outcome = engine::toggle_task(self.curriculum, &mut self.data, task_id);
        let mut fields = vec![Field::CompletedTasks];
        if outcome.achievement.is_some() {
            fields.push(Field::Achievements);
        }
        self.commit(&fields);
        self.dispatch(&outcome.effects);
        Ok(outcome)
    }

    /// Replace the note for a roadmap day
    pub fn update_note(&mut self, day_key: &str, text: &str) -> Result<()> {
        if !self.curriculum.has_day(day_key) {
            return Err(TrackerError::InvalidDayKey(day_key.to_string()));
        }
        engine::set_note(&mut self.data, day_key, text);
        self.commit(&[Field::Notes]);
        Ok(())
    }

    /// Run the daily streak check
    pub fn check_streak(&mut self, today: NaiveDate) -> StreakOutcome {
        let outcome = streak::check_streak(&mut self.data, today);
        if outcome.transition != StreakTransition::SameDay {
            self.commit(&[Field::CurrentStreak, Field::LastActiveDate]);
        }
        self.longest_streak = self.longest_streak.max(outcome.current);
        self.dispatch(&outcome.effects);
        outcome
    }

    /// Account for a stopped stopwatch session; returns the hours added
    pub fn finish_session(&mut self, session: &StoppedSession) -> f64 {
        if !self.options.fold_elapsed_on_stop {
            tracing::info!(
                task = %session.task_id,
                elapsed_secs = session.elapsed_secs,
                "Session time not added to total hours"
            );
            return 0.0;
        }
        if session.elapsed_secs == 0 {
            return 0.0;
        }

        let before = self.data.total_hours;
        let total = engine::add_elapsed_seconds(&mut self.data, session.elapsed_secs);
        tracing::debug!(task = %session.task_id, total_hours = total, "Session folded");
        self.commit(&[Field::TotalHours]);
        total - before
    }

    /// Emit the daily reminder if nothing has happened today
    pub fn remind_if_idle(&mut self, today: NaiveDate) -> bool {
        if !self.options.daily_reminders || self.data.last_active_date >= today {
            return false;
        }
        self.dispatch(&[Effect::notify(NotificationKind::DailyReminder, DAILY_REMINDER)]);
        true
    }

    pub fn statistics(&self) -> engine::Statistics {
        engine::statistics(self.curriculum, &self.data)
    }

    /// This user's leaderboard row
    pub fn leaderboard_entry(&self, now: DateTime<Utc>) -> LeaderboardEntry {
        LeaderboardEntry::project(&self.user.id, self.user.name(), &self.data, now)
    }

    pub fn export_snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot::capture(self.curriculum, &self.data, now)
    }

    /// Replace progress with a snapshot; nothing changes if it is invalid
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        snapshot.validate(self.curriculum, &self.custom_task_ids)?;
        snapshot.apply_to(&mut self.data);
        self.longest_streak = self.longest_streak.max(self.data.current_streak);
        tracing::info!(
            user = %self.user.id,
            completed = self.data.completed_count(),
            "Imported progress snapshot"
        );
        let patch = ProgressPatch::full(&self.data);
        self.pending.absorb(patch);
        self.flush();
        Ok(())
    }

    /// Merge a record written elsewhere
    ///
    /// Fields with unsynced local changes keep the local value; every other
    /// field takes the remote one.
    pub fn apply_remote(&mut self, record: ProgressRecord) {
        let remote = TaskData::from_record(record, self.data.last_active_date);
        let pending = self.pending.fields();
        let keep = |field: Field| pending.contains(&field);

        if !keep(Field::CompletedTasks) {
            self.data.completed_tasks = remote.completed_tasks;
        }
        if !keep(Field::Notes) {
            self.data.notes = remote.notes;
        }
        if !keep(Field::TotalHours) {
            self.data.total_hours = remote.total_hours;
        }
        if !keep(Field::CurrentStreak) {
            self.data.current_streak = remote.current_streak;
        }
        if !keep(Field::LastActiveDate) {
            self.data.last_active_date = remote.last_active_date;
        }
        if !keep(Field::Achievements) {
            self.data.achievements = remote.achievements;
        }
        self.longest_streak = self.longest_streak.max(self.data.current_streak);
        tracing::debug!(user = %self.user.id, kept = ?pending, "Applied remote update");
    }

    /// Retry writing unsynced changes
    pub fn sync(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        match self.store.set(&self.user.id, self.pending.clone()) {
            Ok(()) => {
                self.pending = ProgressPatch::default();
                self.last_sync_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_sync_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn commit(&mut self, fields: &[Field]) {
        let patch = ProgressPatch::from_fields(&self.data, fields);
        self.pending.absorb(patch);
        self.flush();
    }

    /// Write pending fields; a failure keeps them pending
    fn flush(&mut self) {
        if let Err(e) = self.sync() {
            tracing::error!(user = %self.user.id, "Failed to save progress: {}", e);
        }
    }

    fn dispatch(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::Notify { kind, payload } => {
                    self.notifier.notify(&self.user.id, *kind, payload)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::curriculum::model::tests::{sample_curriculum, task};
    use crate::curriculum::{Category, Day, Difficulty, Phase, Week};
    use crate::store::MemoryStore;

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<(NotificationKind, String)>,
    }

    impl Notifier for Recorder {
        fn notify(&mut self, _user_id: &str, kind: NotificationKind, payload: &str) {
            self.sent.push((kind, payload.to_string()));
        }
    }

    impl Recorder {
        fn kinds(&self) -> Vec<NotificationKind> {
            self.sent.iter().map(|(kind, _)| *kind).collect()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    fn user() -> User {
        User { id: "ada".into(), display_name: Some("Ada".into()) }
    }

    fn curriculum_with(count: usize) -> Curriculum {
        let tasks = (0..count).map(|i| task(&format!("task {}", i), Difficulty::Easy)).collect();
        Curriculum::new(vec![Phase {
            title: "Phase".into(),
            description: String::new(),
            weeks: vec![Week {
                title: "Week".into(),
                focus: String::new(),
                days: vec![Day {
                    label: "Day 1".into(),
                    categories: vec![Category { name: "All".into(), tasks }],
                }],
            }],
        }])
    }

    fn session(elapsed_secs: u64) -> StoppedSession {
        StoppedSession { task_id: "0-0-0-0-0".into(), elapsed_secs }
    }

    fn open_with(
        curriculum: &Curriculum,
        store: MemoryStore,
        options: Options,
    ) -> Tracker<'_, MemoryStore, Recorder> {
        Tracker::open(curriculum, user(), store, Recorder::default(), options, today()).unwrap()
    }

    fn open(curriculum: &Curriculum) -> Tracker<'_, MemoryStore, Recorder> {
        open_with(curriculum, MemoryStore::new(), Options::default())
    }

    #[test]
    fn first_open_persists_defaults() {
        let curriculum = sample_curriculum();
        let tracker = open(&curriculum);

        let record = tracker.store().get("ada").unwrap().unwrap();
        assert_eq!(record.last_active_date, Some(today()));
        assert_eq!(record.current_streak, 0);
        assert!(!tracker.has_pending_changes());
    }

    #[test]
    fn open_reads_existing_record() {
        let curriculum = sample_curriculum();
        let store = MemoryStore::new();
        store
            .set(
                "ada",
                ProgressPatch {
                    completed_tasks: Some(vec!["0-0-0-0-0".into()]),
                    current_streak: Some(6),
                    ..Default::default()
                },
            )
            .unwrap();

        let tracker = open_with(&curriculum, store, Options::default());

        assert!(tracker.data().is_completed("0-0-0-0-0"));
        assert_eq!(tracker.longest_streak(), 6);
    }

    #[test]
    fn single_task_roadmap_reaches_full_completion() {
        let curriculum = curriculum_with(1);
        let mut tracker = open(&curriculum);

        let outcome = tracker.toggle_task("0-0-0-0-0").unwrap();

        assert!(outcome.completed);
        assert_eq!(tracker.statistics().completion_percentage, 100);
        assert!(tracker.data().achievements.is_empty());
        assert_eq!(
            tracker.notifier().kinds(),
            vec![NotificationKind::TaskCompletion, NotificationKind::Milestone]
        );
    }

    #[test]
    fn tenth_completion_grants_achievement_once() {
        let curriculum = curriculum_with(12);
        let mut tracker = open(&curriculum);

        for i in 0..10 {
            tracker.toggle_task(&format!("0-0-0-0-{}", i)).unwrap();
        }
        assert_eq!(tracker.data().achievements.len(), 1);
        assert!(tracker.data().achievements.contains("Completed 10 tasks!"));

        // Dropping below ten and coming back does not grant it twice
        tracker.toggle_task("0-0-0-0-9").unwrap();
        tracker.toggle_task("0-0-0-0-10").unwrap();
        assert_eq!(tracker.data().achievements.len(), 1);

        let achievements = tracker
            .notifier()
            .kinds()
            .into_iter()
            .filter(|k| *k == NotificationKind::Achievement)
            .count();
        assert_eq!(achievements, 1);

        let stored = tracker.store().get("ada").unwrap().unwrap();
        assert_eq!(stored.achievements, vec!["Completed 10 tasks!".to_string()]);
    }

    #[test]
    fn streak_extends_from_yesterday() {
        let curriculum = sample_curriculum();
        let store = MemoryStore::new();
        store
            .set(
                "ada",
                ProgressPatch {
                    current_streak: Some(4),
                    last_active_date: today().checked_sub_days(Days::new(1)),
                    ..Default::default()
                },
            )
            .unwrap();
        let mut tracker = open_with(&curriculum, store, Options::default());

        let outcome = tracker.check_streak(today());

        assert_eq!(outcome.current, 5);
        assert_eq!(tracker.data().last_active_date, today());
        assert_eq!(tracker.longest_streak(), 5);
        let stored = tracker.store().get("ada").unwrap().unwrap();
        assert_eq!(stored.current_streak, 5);
        assert_eq!(stored.last_active_date, Some(today()));
        assert_eq!(tracker.notifier().kinds(), vec![NotificationKind::Streak]);
    }

    #[test]
    fn export_import_round_trip_restores_sets() {
        let curriculum = curriculum_with(12);
        let mut tracker = open(&curriculum);
        for i in 0..10 {
            tracker.toggle_task(&format!("0-0-0-0-{}", i)).unwrap();
        }
        let original = tracker.data().clone();
        let json = tracker.export_snapshot(Utc::now()).to_json().unwrap();

        tracker.toggle_task("0-0-0-0-0").unwrap();
        tracker.import_snapshot(Snapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(tracker.data().completed_tasks, original.completed_tasks);
        assert_eq!(tracker.data().achievements, original.achievements);
    }

    #[test]
    fn invalid_snapshot_leaves_state_untouched() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.toggle_task("0-0-0-0-0").unwrap();
        let before = tracker.data().clone();

        let snapshot =
            Snapshot::from_json(r#"{"completedTasks": [], "totalHours": -1.0}"#).unwrap();
        let err = tracker.import_snapshot(snapshot).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(tracker.data(), &before);
    }

    #[test]
    fn snapshot_with_ids_off_the_roadmap_is_rejected() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.toggle_task("0-0-0-0-0").unwrap();
        let before = tracker.data().clone();

        let ids: Vec<String> = (0..50).map(|i| format!("\"bogus-{}\"", i)).collect();
        let json = format!(r#"{{"completedTasks": [{}]}}"#, ids.join(", "));
        let err = tracker.import_snapshot(Snapshot::from_json(&json).unwrap()).unwrap_err();

        assert!(matches!(err, TrackerError::InvalidSnapshot(_)));
        assert_eq!(tracker.data(), &before);
        assert_eq!(tracker.leaderboard_entry(Utc::now()).completed_tasks, 1);
    }

    #[test]
    fn snapshot_may_carry_registered_custom_tasks() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.register_custom_tasks(["custom-1".to_string()]);

        let snapshot =
            Snapshot::from_json(r#"{"completedTasks": ["0-0-0-0-0", "custom-1"]}"#).unwrap();
        tracker.import_snapshot(snapshot).unwrap();

        assert_eq!(tracker.data().completed_count(), 2);
    }

    #[test]
    fn stale_completion_can_still_be_toggled_off() {
        let curriculum = sample_curriculum();
        let record = {
            let mut tracker = open(&curriculum);
            tracker.register_custom_tasks(["custom-gone".to_string()]);
            tracker.toggle_task("custom-gone").unwrap();
            tracker.store().get("ada").unwrap().unwrap()
        };

        // Next session: the custom task was deleted, so it is not registered
        let store = MemoryStore::new();
        store.put_remote("ada", record);
        let mut tracker = open_with(&curriculum, store, Options::default());
        assert!(tracker.data().is_completed("custom-gone"));

        let outcome = tracker.toggle_task("custom-gone").unwrap();
        assert!(!outcome.completed);
        assert_eq!(tracker.data().completed_count(), 0);

        // ...but it cannot be completed again
        assert!(matches!(
            tracker.toggle_task("custom-gone"),
            Err(TrackerError::InvalidTaskId(_))
        ));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);

        assert!(matches!(tracker.toggle_task("9-9-9-9-9"), Err(TrackerError::InvalidTaskId(_))));
        assert!(matches!(tracker.toggle_task("custom-x"), Err(TrackerError::InvalidTaskId(_))));
        assert!(matches!(tracker.update_note("7-0-0", "x"), Err(TrackerError::InvalidDayKey(_))));
        assert_eq!(tracker.data().completed_count(), 0);
        assert!(tracker.notifier().sent.is_empty());
    }

    #[test]
    fn registered_custom_tasks_can_be_toggled() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.register_custom_tasks(["custom-1".to_string(), "0-9-9-9-9".to_string()]);

        let outcome = tracker.toggle_task("custom-1").unwrap();
        assert!(tracker.toggle_task("0-9-9-9-9").is_err());

        assert!(outcome.completed);
        assert_eq!(tracker.statistics().completion_percentage, 0);
        assert_eq!(tracker.statistics().completed_tasks, 1);
    }

    #[test]
    fn notes_are_last_write_wins() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.update_note("0-0-1", "first").unwrap();
        tracker.update_note("0-0-1", "second").unwrap();

        assert_eq!(tracker.data().note("0-0-1"), Some("second"));
        let stored = tracker.store().get("ada").unwrap().unwrap();
        assert_eq!(stored.notes.get("0-0-1").map(String::as_str), Some("second"));
    }

    #[test]
    fn finished_session_folds_into_hours() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);

        let added = tracker.finish_session(&session(5400));

        assert_eq!(added, 1.5);
        assert_eq!(tracker.data().total_hours, 1.5);
        assert_eq!(tracker.store().get("ada").unwrap().unwrap().total_hours, 1.5);
    }

    #[test]
    fn folding_can_be_disabled() {
        let curriculum = sample_curriculum();
        let options = Options { fold_elapsed_on_stop: false, ..Options::default() };
        let mut tracker = open_with(&curriculum, MemoryStore::new(), options);

        let added = tracker.finish_session(&session(600));

        assert_eq!(added, 0.0);
        assert_eq!(tracker.data().total_hours, 0.0);
    }

    #[test]
    fn store_failure_keeps_change_pending_until_sync() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.store().set_offline(true);

        let outcome = tracker.toggle_task("0-0-0-0-0").unwrap();

        assert!(outcome.completed);
        assert!(tracker.data().is_completed("0-0-0-0-0"));
        assert!(tracker.has_pending_changes());
        assert!(tracker.last_sync_error().is_some());
        assert_eq!(tracker.notifier().kinds()[0], NotificationKind::TaskCompletion);

        assert!(tracker.sync().is_err());

        tracker.store().set_offline(false);
        tracker.sync().unwrap();
        assert!(!tracker.has_pending_changes());
        assert!(tracker.last_sync_error().is_none());
        let stored = tracker.store().get("ada").unwrap().unwrap();
        assert_eq!(stored.completed_tasks, vec!["0-0-0-0-0".to_string()]);
    }

    #[test]
    fn remote_update_does_not_clobber_pending_fields() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.store().set_offline(true);
        tracker.toggle_task("0-0-0-0-1").unwrap();

        tracker.apply_remote(ProgressRecord {
            completed_tasks: vec!["1-0-0-0-0".into()],
            total_hours: 4.0,
            current_streak: 3,
            ..Default::default()
        });

        assert!(tracker.data().is_completed("0-0-0-0-1"));
        assert!(!tracker.data().is_completed("1-0-0-0-0"));
        assert_eq!(tracker.data().total_hours, 4.0);
        assert_eq!(tracker.data().current_streak, 3);
        assert_eq!(tracker.data().last_active_date, today());
    }

    #[test]
    fn remote_update_applies_when_nothing_pending() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        let mut sub = tracker.store().subscribe("ada");

        tracker.store().put_remote(
            "ada",
            ProgressRecord { completed_tasks: vec!["1-0-0-0-0".into()], ..Default::default() },
        );
        let record = sub.try_next().unwrap();
        tracker.apply_remote(record);

        assert!(tracker.data().is_completed("1-0-0-0-0"));
    }

    #[test]
    fn daily_reminder_only_when_idle() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);

        assert!(!tracker.remind_if_idle(today()));
        let tomorrow = today().succ_opt().unwrap();
        assert!(tracker.remind_if_idle(tomorrow));
        assert_eq!(
            tracker.notifier().sent,
            vec![(NotificationKind::DailyReminder, DAILY_REMINDER.to_string())]
        );
    }

    #[test]
    fn leaderboard_entry_uses_display_name() {
        let curriculum = sample_curriculum();
        let mut tracker = open(&curriculum);
        tracker.toggle_task("0-0-0-0-0").unwrap();

        let entry = tracker.leaderboard_entry(Utc::now());
        assert_eq!(entry.name, "Ada");
        assert_eq!(entry.completed_tasks, 1);
        assert_eq!(entry.score, 10.0);
    }
}
