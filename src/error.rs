//! Error types for the tracker core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while tracking progress
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Task identifier does not resolve to a roadmap or custom task
    #[error("Unknown task id '{0}'")]
    InvalidTaskId(String),

    /// Day key does not name a day in the roadmap
    #[error("Unknown day '{0}'. Day keys look like 0-1-2 (phase-week-day)")]
    InvalidDayKey(String),

    /// Snapshot file could not be parsed
    #[error("Invalid snapshot file: {0}")]
    Import(#[source] serde_json::Error),

    /// Snapshot parsed but carries values that cannot be applied
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Reading or writing a data file failed
    #[error("Failed to access {path:?}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The progress store rejected or failed an operation
    #[error("Progress store error: {0}")]
    Store(String),

    /// The requester does not own the record
    #[error("{record} '{id}' belongs to another user")]
    NotOwner {
        /// Kind of record ("Task", "Bookmark", ...)
        record: &'static str,
        /// Record identifier
        id: String,
    },

    /// No record with this identifier exists
    #[error("{record} '{id}' not found")]
    NotFound {
        /// Kind of record ("Task", "Bookmark", ...)
        record: &'static str,
        /// Record identifier
        id: String,
    },

    /// An operation needs a signed-in user
    #[error("Not signed in. Run `roadmap login <name>` first")]
    NotSignedIn,

    /// The stopwatch task has shut down
    #[error("Stopwatch is no longer running")]
    StopwatchClosed,
}

impl TrackerError {
    /// Check if this error was caused by bad user input (state is untouched)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidTaskId(_)
                | TrackerError::InvalidDayKey(_)
                | TrackerError::Import(_)
                | TrackerError::InvalidSnapshot(_)
        )
    }

    /// Check if this error came from persistence (local state is still valid)
    pub fn is_io(&self) -> bool {
        matches!(self, TrackerError::Io { .. } | TrackerError::Json(_) | TrackerError::Store(_))
    }
}

/// Result alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
