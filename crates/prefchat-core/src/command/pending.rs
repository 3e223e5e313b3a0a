use serde::{Deserialize, Serialize};

/// Lifecycle of a proposed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Awaiting the user's decision.
    Armed,
    /// Confirmed; the executor call is outstanding.
    Confirmed,
    Cancelled,
    Executed,
    Failed,
}

/// The single command currently held by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub text: String,
    pub state: CommandState,
}

/// How a confirmed command ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    Executed,
    /// The executor's reason, verbatim.
    Failed { reason: String },
}

/// Result of [`super::CommandGate::confirm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResolution {
    pub command: String,
    pub outcome: CommandOutcome,
}

impl CommandResolution {
    pub fn is_executed(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Executed)
    }
}
