//! Application directory helpers anchored to a single `.vidsift` folder.
//!
//! Config, the local review database, and log files all live under one root
//! inside the OS config directory. A `VIDSIFT_CONFIG_HOME` override exists for
//! tests and portable setups.

use std::{
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory under the OS config root.
pub const APP_DIR_NAME: &str = ".vidsift";

static BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Errors raised while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available")]
    NoBaseDir,
    /// Failed to create a directory under the application root.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the `.vidsift` root, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Directory holding the local review database.
pub fn data_dir() -> Result<PathBuf, AppDirError> {
    let root = app_root_dir()?;
    ensure_dir(root.join("data"))
}

/// Directory holding per-launch log files.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let root = app_root_dir()?;
    ensure_dir(root.join("logs"))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn base_dir() -> Option<PathBuf> {
    if let Some(path) = BASE_OVERRIDE.lock().ok().and_then(|guard| guard.clone()) {
        return Some(path);
    }
    if let Ok(path) = std::env::var("VIDSIFT_CONFIG_HOME") {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
pub(crate) fn set_base_override(path: PathBuf) {
    if let Ok(mut guard) = BASE_OVERRIDE.lock() {
        *guard = Some(path);
    }
}

#[cfg(test)]
pub(crate) fn clear_base_override() {
    if let Ok(mut guard) = BASE_OVERRIDE.lock() {
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn app_dirs_nest_under_override_root() {
        let dir = tempdir().unwrap();
        set_base_override(dir.path().to_path_buf());
        let root = app_root_dir().unwrap();
        assert!(root.ends_with(APP_DIR_NAME));
        assert!(root.starts_with(dir.path()));
        let data = data_dir().unwrap();
        let logs = logs_dir().unwrap();
        assert!(data.is_dir());
        assert!(logs.is_dir());
        clear_base_override();
    }
}
