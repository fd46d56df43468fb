//! Configuration management for the roadmap tracker

pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Environment variable that relocates the data directory
pub const DATA_DIR_ENV: &str = "ROADMAP_TRACKER_DATA_DIR";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record notifications in the inbox
    pub notifications: bool,

    /// Remind on the first command of a day with no activity yet
    pub daily_reminders: bool,

    /// Add stopwatch time to total hours when the stopwatch is stopped
    pub fold_elapsed_on_stop: bool,

    /// Rows shown by `leaderboard`
    pub leaderboard_limit: usize,

    /// Rows shown by `notifications`
    pub notification_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notifications: true,
            daily_reminders: true,
            fold_elapsed_on_stop: true,
            leaderboard_limit: 10,
            notification_limit: crate::notify::inbox::DEFAULT_RECENT_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        save_json(&Self::config_path()?, self)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir).join("config.json"));
        }
        Ok(project_dirs()?.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "roadmap-tracker").context("Failed to determine data directory")
}

/// Read a JSON document, or the default value if the file does not exist yet
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

/// Write a JSON document, creating parent directories as needed
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {:?}", path))?;

    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_folds_elapsed_time() {
        let config = Config::default();
        assert!(config.fold_elapsed_on_stop);
        assert!(config.notifications);
    }

    #[test]
    fn config_serializes_to_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("leaderboard_limit"));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let json = r#"{"notifications":false}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(!config.notifications);
        assert_eq!(config.leaderboard_limit, 10);
        assert!(config.daily_reminders);
    }

    #[test]
    fn load_json_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let value: Vec<String> = load_json(&dir.path().join("missing.json")).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn save_json_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("value.json");
        save_json(&path, &vec!["a".to_string()]).unwrap();
        let loaded: Vec<String> = load_json(&path).unwrap();
        assert_eq!(loaded, vec!["a".to_string()]);
    }

    #[test]
    fn load_json_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_json::<Vec<String>>(&path).is_err());
    }
}
