//! Focus stopwatch
//!
//! ```text
//!            start(task)            toggle_pause
//!   Idle ---------------> Running <-------------> Paused
//!    ^                       |                      |
//!    +------- stop ----------+-------- stop --------+
//! ```
//!
//! `start` from Running or Paused overwrites the current session. The
//! discarded session is handed back so the caller can decide what to do
//! with it.

pub mod driver;

use serde::{Deserialize, Serialize};

pub use driver::{StopwatchDriver, StopwatchHandle};

/// Coarse state of the stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchStatus {
    Idle,
    Running,
    Paused,
}

/// Observable stopwatch state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchState {
    /// Is time being counted?
    pub is_running: bool,
    /// Elapsed seconds in the current session
    pub current_time: u64,
    /// Task the session is bound to
    pub current_task_id: Option<String>,
}

/// A session that ended, either by `stop` or by being overwritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedSession {
    pub task_id: String,
    pub elapsed_secs: u64,
}

/// Pure stopwatch state machine; ticks are fed in from outside
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    state: StopwatchState,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &StopwatchState {
        &self.state
    }

    pub fn status(&self) -> StopwatchStatus {
        match (&self.state.current_task_id, self.state.is_running) {
            (None, _) => StopwatchStatus::Idle,
            (Some(_), true) => StopwatchStatus::Running,
            (Some(_), false) => StopwatchStatus::Paused,
        }
    }

    /// Start timing `task_id` from zero
    ///
    /// Returns the session that was replaced, if one was active.
    pub fn start(&mut self, task_id: impl Into<String>) -> Option<StoppedSession> {
        let discarded = self.take_session();
        self.state = StopwatchState {
            is_running: true,
            current_time: 0,
            current_task_id: Some(task_id.into()),
        };
        discarded
    }

    /// Pause a running session or resume a paused one; no-op when idle
    pub fn toggle_pause(&mut self) -> StopwatchStatus {
        if self.state.current_task_id.is_some() {
            self.state.is_running = !self.state.is_running;
        }
        self.status()
    }

    /// End the session and return to idle
    pub fn stop(&mut self) -> Option<StoppedSession> {
        let session = self.take_session();
        self.state = StopwatchState::default();
        session
    }

    /// Count one second; returns whether the tick was applied
    pub fn tick(&mut self) -> bool {
        if self.state.is_running {
            self.state.current_time = self.state.current_time.saturating_add(1);
            true
        } else {
            false
        }
    }

    fn take_session(&mut self) -> Option<StoppedSession> {
        self.state
            .current_task_id
            .take()
            .map(|task_id| StoppedSession { task_id, elapsed_secs: self.state.current_time })
    }
}
