//! Roadmap Tracker - progress tracking for a structured study roadmap
//!
//! Work through a fixed roadmap of tasks, time focus sessions, keep a daily
//! streak, earn achievements and compare progress on a leaderboard.

pub mod app;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod export;
pub mod leaderboard;
pub mod notify;
pub mod progress;
pub mod stopwatch;
pub mod store;
pub mod tasks;

pub use app::{Options, Tracker};
pub use config::Config;
pub use error::TrackerError;
