//! Background task that drives a [`Stopwatch`] from a one-second interval

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{Stopwatch, StopwatchState, StopwatchStatus, StoppedSession};
use crate::error::{Result, TrackerError};

const TICK: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 16;

enum Command {
    Start { task_id: String, reply: oneshot::Sender<Option<StoppedSession>> },
    TogglePause { reply: oneshot::Sender<StopwatchStatus> },
    Stop { reply: oneshot::Sender<Option<StoppedSession>> },
}

/// Owns the stopwatch; commands and ticks are applied in arrival order
pub struct StopwatchDriver {
    stopwatch: Stopwatch,
    commands: mpsc::Receiver<Command>,
    state_tx: watch::Sender<StopwatchState>,
    interval: Interval,
    cancel_token: CancellationToken,
}

impl StopwatchDriver {
    /// Spawn the driver on the current tokio runtime
    pub fn spawn() -> StopwatchHandle {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(StopwatchState::default());
        let cancel_token = CancellationToken::new();

        let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let driver = StopwatchDriver {
            stopwatch: Stopwatch::new(),
            commands,
            state_tx,
            interval,
            cancel_token: cancel_token.clone(),
        };
        tokio::spawn(driver.run());

        StopwatchHandle { tx, state_rx, cancel_token }
    }

    async fn run(mut self) {
        loop {
            let running = self.stopwatch.state().is_running;

            tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => {
                    tracing::debug!("Stopwatch driver cancelled");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    // Every handle is gone
                    None => break,
                },

                // Only polled while running, so a pause never accumulates ticks
                _ = self.interval.tick(), if running => {
                    self.stopwatch.tick();
                    self.publish();
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start { task_id, reply } => {
                tracing::debug!(task = %task_id, "Stopwatch started");
                let discarded = self.stopwatch.start(task_id);
                if let Some(session) = &discarded {
                    tracing::info!(
                        task = %session.task_id,
                        elapsed_secs = session.elapsed_secs,
                        "Discarding session replaced by a new start"
                    );
                }
                self.interval.reset();
                self.publish();
                let _ = reply.send(discarded);
            }
            Command::TogglePause { reply } => {
                let status = self.stopwatch.toggle_pause();
                tracing::debug!(?status, "Stopwatch toggled");
                if status == StopwatchStatus::Running {
                    self.interval.reset();
                }
                self.publish();
                let _ = reply.send(status);
            }
            Command::Stop { reply } => {
                let session = self.stopwatch.stop();
                tracing::debug!(?session, "Stopwatch stopped");
                self.publish();
                let _ = reply.send(session);
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.stopwatch.state().clone());
    }
}

/// Cloneable handle to a running [`StopwatchDriver`]
#[derive(Clone)]
pub struct StopwatchHandle {
    tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<StopwatchState>,
    cancel_token: CancellationToken,
}

impl StopwatchHandle {
    /// Start timing a task; returns the session it replaced
    pub async fn start(&self, task_id: impl Into<String>) -> Result<Option<StoppedSession>> {
        let task_id = task_id.into();
        self.request(|reply| Command::Start { task_id, reply }).await
    }

    /// Pause or resume; returns the new status
    pub async fn toggle_pause(&self) -> Result<StopwatchStatus> {
        self.request(|reply| Command::TogglePause { reply }).await
    }

    /// Stop and return the finished session
    pub async fn stop(&self) -> Result<Option<StoppedSession>> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> StopwatchState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that wakes on every published state
    pub fn subscribe(&self) -> watch::Receiver<StopwatchState> {
        self.state_rx.clone()
    }

    /// Stop the driver task
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx.send(command(reply)).await.map_err(|_| TrackerError::StopwatchClosed)?;
        response.await.map_err(|_| TrackerError::StopwatchClosed)
    }
}
