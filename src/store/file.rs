//! JSON-file progress store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ChangeFeed, ProgressPatch, ProgressRecord, ProgressStore, Subscription};
use crate::error::{Result, TrackerError};

/// On-disk layout of `progress.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    users: BTreeMap<String, ProgressRecord>,
}

/// Stores every user's record in one JSON file
///
/// The file is re-read on each access so separate processes see each
/// other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    feed: ChangeFeed,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), feed: ChangeFeed::default() }
    }

    /// `progress.json` in the given data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("progress.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ProgressFile> {
        if !self.path.exists() {
            return Ok(ProgressFile::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|source| TrackerError::Io { path: self.path.clone(), source })?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, file: &ProgressFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| TrackerError::Io { path: parent.to_path_buf(), source })?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, contents)
            .map_err(|source| TrackerError::Io { path: self.path.clone(), source })
    }
}

impl ProgressStore for FileStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        Ok(self.read()?.users.remove(user_id))
    }

    fn set(&self, user_id: &str, patch: ProgressPatch) -> Result<()> {
        let mut file = self.read()?;
        let record = file.users.entry(user_id.to_string()).or_default();
        record.merge(patch);
        let record = record.clone();

        self.write(&file)?;
        tracing::debug!(user = user_id, path = ?self.path, "Progress saved");
        self.feed.publish(user_id, record);
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Subscription {
        self.feed.subscribe(user_id)
    }
}
