//! Application configuration model (`config.toml`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::preference::Platform;

/// Root configuration structure for config.toml
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Model server used for the catalog and generation.
    pub ollama_url: String,
    /// Preference and liveness server.
    pub server_url: String,
    pub liveness_path: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://127.0.0.1:11434".to_string(),
            server_url: "http://127.0.0.1:8000".to_string(),
            liveness_path: "/health".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound for one turn before the in-flight lock is released.
    pub timeout_secs: u64,
    /// Chat messages kept per session by the generation backend.
    pub history_limit: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            history_limit: 50,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// `auto`, `windows`, `macos` or `gnome`.
    pub platform: String,
    /// Only run command bases listed in the preference snapshot.
    pub enforce_allow_list: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            platform: "auto".to_string(),
            enforce_allow_list: true,
        }
    }
}

impl ExecutorConfig {
    /// Resolves the configured platform, detecting it for `auto`.
    ///
    /// Returns `Ok(None)` when auto-detection finds no supported desktop.
    pub fn resolve_platform(&self) -> Result<Option<Platform>> {
        if self.platform.trim().eq_ignore_ascii_case("auto") {
            return Ok(Platform::detect());
        }
        self.platform.parse().map(Some)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log directory. Empty means `<config dir>/logs`.
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: String::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UserConfig {
    /// Name used to address the preference backend.
    pub name: String,
}

impl UserConfig {
    /// Configured name, else `$USER`/`$USERNAME`, else `unknown_user`.
    pub fn resolve_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.trim().to_string();
        }
        ["USER", "USERNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "unknown_user".to_string())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PreferencesConfig {
    /// JSON file with the preferences used until the server answers.
    /// Empty means the bundled defaults.
    pub defaults_path: String,
}

impl PreferencesConfig {
    pub fn defaults_path(&self) -> Option<PathBuf> {
        let path = self.defaults_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}
