//! Unified path management for Cinoa Surfacing files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/cinoa-surfacing/        # Config directory
//! ├── settings.toml                 # apiKey, modelName, launchAtLogin
//! └── logs/                         # Application logs
//!     └── surfacing.log.YYYY-MM-DD
//!
//! ~/.config/autostart/              # XDG autostart entries
//! └── cinoa-surfacing.desktop
//! ```
//!
//! Passing a base directory relocates everything under it (used by tests and
//! `--config-dir`).

use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "cinoa-surfacing";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for surfacing_core::SurfacingError {
    fn from(err: PathError) -> Self {
        surfacing_core::SurfacingError::io(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurfacingPaths {
    base: Option<PathBuf>,
}

impl SurfacingPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// The application config directory (e.g. `~/.config/cinoa-surfacing/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn settings_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("settings.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// The XDG autostart directory (`~/.config/autostart/`).
    pub fn autostart_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("autostart")),
            None => dirs::config_dir()
                .map(|dir| dir.join("autostart"))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }
}
