//! Unified path management for prefchat configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/prefchat/          # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── prefchat.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_DIR: &str = "prefchat";

/// Resolves prefchat's config and log locations.
///
/// `PrefchatPaths::new(None)` uses the platform config directory; passing a
/// base directory roots everything there instead (tests, portable installs).
#[derive(Debug, Clone)]
pub struct PrefchatPaths {
    base_override: Option<PathBuf>,
}

impl PrefchatPaths {
    pub fn new(base_override: Option<PathBuf>) -> Self {
        Self { base_override }
    }

    /// Returns the prefchat configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/prefchat/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base_override {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the log directory, honouring a non-empty configured one.
    pub fn logs_dir(&self, configured: &str) -> Result<PathBuf, PathError> {
        let configured = configured.trim();
        if !configured.is_empty() {
            return Ok(Path::new(configured).to_path_buf());
        }
        Ok(self.config_dir()?.join("logs"))
    }
}
