use serde::{Deserialize, Serialize};

use crate::command::CommandOutcome;
use crate::session::Message;

/// Notifications published by the application to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A fresh model catalog is available. Empty means "no models available".
    ModelsLoaded { models: Vec<String> },
    /// A model was selected and a new conversation started.
    SessionStarted { model_id: String, session_id: String },
    MessageAppended { session_id: String, message: Message },
    TurnStarted { session_id: String },
    TurnSettled { session_id: String },
    /// A command awaits the user's decision. The text must be shown as is.
    CommandArmed { command: String },
    CommandResolved {
        command: String,
        outcome: CommandOutcome,
    },
    /// The armed command was discarded without running.
    CommandCancelled { command: String },
    PreferencesUpdated { settings: usize },
    ConnectivityChanged { online: bool },
    /// Recoverable problem the user should notice.
    Warning { message: String },
    Error { message: String },
    /// The application finished initializing. Emitted at most once.
    Ready,
}
