use std::sync::Arc;

use tokio::sync::Mutex;

use super::pending::{CommandOutcome, CommandResolution, CommandState, PendingCommand};
use crate::backend::{CommandExecutor, ExecuteCommandRequest};
use crate::error::{PrefchatError, Result};

/// Guards execution of model-proposed commands.
///
/// States: `Empty` → `Armed` → (`Cancelled` | `Confirmed` → `Executed` |
/// `Failed`) → `Empty`. The slot holds at most one [`PendingCommand`], and
/// the executor is only ever called from [`CommandGate::confirm`].
///
/// One gate exists per application instance; it is shared by handle rather
/// than owned by a session, so a pending command survives a model switch.
pub struct CommandGate {
    slot: Mutex<Option<PendingCommand>>,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandGate {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            slot: Mutex::new(None),
            executor,
        }
    }

    /// Holds `text` for a decision.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if a command is already held (armed or executing)
    /// - `InvalidState` if `text` is blank
    pub async fn arm(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PrefchatError::invalid_state("Refusing to arm an empty command"));
        }

        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref() {
            tracing::warn!(
                "[gate] Rejected arm of '{}': '{}' is still {:?}",
                text,
                existing.text,
                existing.state
            );
            return Err(PrefchatError::invalid_state(format!(
                "A command is already pending: {}",
                existing.text
            )));
        }

        tracing::info!("[gate] Armed: {}", text);
        *slot = Some(PendingCommand {
            text,
            state: CommandState::Armed,
        });
        Ok(())
    }

    /// Discards the armed command without calling the executor.
    ///
    /// Returns the discarded text, or `None` if nothing was armed.
    pub async fn cancel(&self) -> Option<String> {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(pending) if pending.state == CommandState::Armed => {
                let text = pending.text.clone();
                *slot = None;
                tracing::info!("[gate] {:?}: {}", CommandState::Cancelled, text);
                Some(text)
            }
            _ => None,
        }
    }

    /// Confirms the armed command and runs it with `persist = true`.
    ///
    /// The gate is back to `Empty` when this returns, whatever the outcome.
    /// Returns `None` (and does nothing) if no command was armed. Failed
    /// commands are never retried.
    pub async fn confirm(&self) -> Option<CommandResolution> {
        let command = {
            let mut slot = self.slot.lock().await;
            let pending = slot
                .as_mut()
                .filter(|p| p.state == CommandState::Armed)?;
            pending.state = CommandState::Confirmed;
            pending.text.clone()
        };

        tracing::info!("[gate] Confirmed, executing: {}", command);
        let result = self
            .executor
            .execute(ExecuteCommandRequest {
                command: command.clone(),
                persist: true,
            })
            .await;

        let (state, outcome) = match result {
            Ok(()) => (CommandState::Executed, CommandOutcome::Executed),
            Err(err) => {
                tracing::error!("[gate] Command '{}' failed: {}", command, err);
                (
                    CommandState::Failed,
                    CommandOutcome::Failed {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let mut slot = self.slot.lock().await;
        if let Some(pending) = slot.as_mut() {
            pending.state = state;
        }
        tracing::debug!("[gate] {:?} → Empty: {}", state, command);
        *slot = None;

        Some(CommandResolution { command, outcome })
    }

    /// Returns a copy of the held command, if any.
    pub async fn pending(&self) -> Option<PendingCommand> {
        self.slot.lock().await.clone()
    }

    /// Returns the armed command text, if the gate awaits a decision.
    pub async fn armed_command(&self) -> Option<String> {
        self.slot
            .lock()
            .await
            .as_ref()
            .filter(|p| p.state == CommandState::Armed)
            .map(|p| p.text.clone())
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.lock().await.is_none()
    }
}
