//! Persisted review settings.
//!
//! Settings live in a TOML file under the application root. Missing files
//! yield defaults and out-of-range values are normalized on load, so a stale
//! or hand-edited file never breaks startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::session::SortMode;

/// Default filename used to store the review settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors while loading or saving the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("Failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write settings at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Reviewer-tunable settings for the session core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Items per page in every paged view.
    pub page_size: usize,
    /// Sample size drawn from each rank range.
    pub sample_size: usize,
    /// True-positive goal the range reports are classified against.
    pub true_positive_goal: usize,
    /// Size of the top-N window used for projection.
    pub top_n_displayed: usize,
    /// Ordering of the labeling list.
    pub sort_mode: SortMode,
    /// Remote label store endpoint; absent means local-only operation.
    pub remote_endpoint: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 100,
            sample_size: 100,
            true_positive_goal: 100,
            top_n_displayed: 100,
            sort_mode: SortMode::ConfidenceDesc,
            remote_endpoint: None,
        }
    }
}

impl Settings {
    /// Clamp nonsense values back to defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Settings::default();
        if self.page_size == 0 {
            self.page_size = defaults.page_size;
        }
        if self.sample_size == 0 {
            self.sample_size = defaults.sample_size;
        }
        if self.true_positive_goal == 0 {
            self.true_positive_goal = defaults.true_positive_goal;
        }
        if self.top_n_displayed == 0 {
            self.top_n_displayed = defaults.top_n_displayed;
        }
        self
    }
}

/// Resolve the settings file path under the application root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from the default location, falling back to defaults when
/// the file does not exist.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    load_from(&config_path()?)
}

/// Load settings from a specific path.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(settings.normalized())
}

/// Persist settings, creating parent directories as needed.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(settings)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
