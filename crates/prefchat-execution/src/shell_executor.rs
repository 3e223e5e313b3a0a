//! Runs confirmed preference commands on the local machine.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use prefchat_core::backend::{CommandExecutor, ExecuteCommandRequest, PreferenceBackend};
use prefchat_core::error::{PrefchatError, Result};
use prefchat_core::preference::{Platform, PreferenceSnapshot, SnapshotStore};
use tokio::process::Command;

/// A command split into the base found in the preference snapshot and the
/// value appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedCommand<'a> {
    program: &'a str,
    args: Vec<&'a str>,
    base: String,
    value: &'a str,
}

fn parse_command(command: &str) -> Result<ParsedCommand<'_>> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some((value, base_parts)) = parts.split_last() else {
        return Err(PrefchatError::execution("Empty command"));
    };
    if base_parts.is_empty() {
        return Err(PrefchatError::execution(format!(
            "Invalid command format '{command}': expected a base command and a value"
        )));
    }
    Ok(ParsedCommand {
        program: base_parts[0],
        args: parts[1..].to_vec(),
        base: base_parts.join(" "),
        value: *value,
    })
}

/// [`CommandExecutor`] that spawns the command directly, without a shell.
///
/// With the allow-list enforced, only commands whose base matches a setting's
/// command for the current platform are run. After a successful run with
/// `persist`, the setting's new value is written back to the preference
/// server; a failed write is logged and does not fail the command.
pub struct ShellCommandExecutor {
    platform: Option<Platform>,
    snapshot: SnapshotStore,
    preferences: Arc<dyn PreferenceBackend>,
    enforce_allow_list: bool,
}

impl ShellCommandExecutor {
    pub fn new(
        platform: Option<Platform>,
        snapshot: SnapshotStore,
        preferences: Arc<dyn PreferenceBackend>,
    ) -> Self {
        Self {
            platform,
            snapshot,
            preferences,
            enforce_allow_list: true,
        }
    }

    pub fn with_allow_list(mut self, enforce: bool) -> Self {
        self.enforce_allow_list = enforce;
        self
    }

    /// Name of the setting `base` belongs to, if any.
    fn setting_for(
        &self,
        snapshot: Option<&PreferenceSnapshot>,
        base: &str,
    ) -> Option<String> {
        let platform = self.platform?;
        snapshot?
            .find_by_command(platform, base)
            .map(str::to_string)
    }

    fn authorize(&self, snapshot: Option<&PreferenceSnapshot>, base: &str) -> Result<Option<String>> {
        let setting = self.setting_for(snapshot, base);
        if !self.enforce_allow_list {
            return Ok(setting);
        }
        if self.platform.is_none() {
            return Err(PrefchatError::unauthorized(format!(
                "'{base}': platform could not be determined"
            )));
        }
        if snapshot.is_none() {
            return Err(PrefchatError::unauthorized(format!(
                "'{base}': no preferences loaded"
            )));
        }
        setting.map(Some).ok_or_else(|| {
            PrefchatError::unauthorized(format!("Unrecognized command base '{base}'"))
        })
    }

    async fn persist(&self, snapshot: &PreferenceSnapshot, setting: &str, raw_value: &str) {
        let Some(current) = snapshot.get(setting).map(|s| &s.current) else {
            return;
        };
        let value = current.parse_like(raw_value);
        let Some(updated) = snapshot.with_current(setting, value.clone()) else {
            return;
        };

        match self.preferences.store_preferences(&updated).await {
            Ok(()) => tracing::info!("[executor] Stored '{}' = {}", setting, value),
            Err(err) => tracing::warn!(
                setting = setting,
                "[executor] Command ran but storing the new value failed: {}",
                err
            ),
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn execute(&self, request: ExecuteCommandRequest) -> Result<()> {
        let parsed = parse_command(&request.command)?;
        let snapshot = self.snapshot.get().await;
        let setting = self.authorize(snapshot.as_deref(), &parsed.base)?;

        tracing::info!("[executor] Running: {}", request.command);
        let output = Command::new(parsed.program)
            .args(&parsed.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| {
                PrefchatError::execution(format!("Failed to start '{}': {}", parsed.program, err))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
            return Err(PrefchatError::execution(if stderr.is_empty() {
                format!("'{}' exited with {}", request.command, code)
            } else {
                format!("'{}' exited with {}: {}", request.command, code, stderr)
            }));
        }
        tracing::debug!(
            "[executor] stdout: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );

        if request.persist
            && let (Some(snapshot), Some(setting)) = (snapshot.as_deref(), setting.as_deref())
        {
            self.persist(snapshot, setting, parsed.value).await;
        }
        Ok(())
    }
}
