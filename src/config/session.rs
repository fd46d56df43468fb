//! Session state persistence
//!
//! Remembers who is signed in and which phase was last viewed, so the next
//! command picks up where the previous one left off.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Config;
use crate::auth::User;

/// Session state shared by all commands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Currently signed-in user (if any)
    pub current_user: Option<User>,
    /// Phase shown by `roadmap` when none is given
    #[serde(default)]
    pub active_phase: usize,
}

impl Session {
    /// Load session from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::session_path()?)
    }

    /// Load session from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        super::load_json(path)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::session_path()?)
    }

    /// Save session to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        super::save_json(path, self)
    }

    /// Get the path to the session file
    pub fn session_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }
}
