//! Generation Pipeline: one request/response exchange per user turn.

use std::sync::Arc;
use std::time::Duration;

use prefchat_core::backend::{GenerationBackend, GenerationRequest, GenerationResult};
use prefchat_core::command::CommandGate;
use prefchat_core::error::{PrefchatError, Result};
use prefchat_core::event::AppEvent;
use prefchat_core::session::{Message, SessionManager, TurnStart};
use tokio::sync::Mutex;

use crate::events::EventPublisher;

/// What became of a submitted prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A precondition did not hold (empty prompt, turn already in flight,
    /// command awaiting a decision). Nothing changed.
    Ignored,
    /// No model is selected; a warning was published.
    NoModel,
    /// The bot reply was appended. `armed` is the command now awaiting
    /// confirmation, if the reply carried one and the gate accepted it.
    Completed { armed: Option<String> },
    /// The backend failed or timed out. The user message stays in the log.
    Failed(PrefchatError),
    /// The session was replaced while the call was outstanding; the response
    /// was dropped.
    Discarded,
}

/// Drives turns against the active session.
///
/// Each request is tagged with the session id it was issued for, and every
/// write back into the session is addressed by that id, so a response that
/// arrives after a model switch cannot touch the new session.
///
/// Admitting a turn (no armed command, no turn in flight) and arming a
/// proposed command both happen under the same admission lock.
pub struct GenerationPipeline {
    sessions: SessionManager,
    backend: Arc<dyn GenerationBackend>,
    gate: Arc<CommandGate>,
    events: EventPublisher,
    timeout: Duration,
    admission: Mutex<()>,
}

impl GenerationPipeline {
    pub fn new(
        sessions: SessionManager,
        backend: Arc<dyn GenerationBackend>,
        gate: Arc<CommandGate>,
        events: EventPublisher,
        timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            backend,
            gate,
            events,
            timeout,
            admission: Mutex::new(()),
        }
    }

    /// Lets the backend release what it keeps for a replaced session.
    pub async fn end_session(&self, session_id: &str) {
        self.backend.end_session(session_id).await;
    }

    pub async fn submit_turn(&self, prompt: &str) -> TurnOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return TurnOutcome::Ignored;
        }
        let user_message = Message::user(prompt);
        let admission = self.admission.lock().await;
        if let Some(pending) = self.gate.armed_command().await {
            tracing::debug!("[generation] Turn refused, '{}' awaits a decision", pending);
            return TurnOutcome::Ignored;
        }
        let start = self.sessions.begin_turn(user_message.clone()).await;
        drop(admission);

        let (model_id, session_id) = match start {
            TurnStart::NoModel => {
                self.events.publish(AppEvent::Warning {
                    message: "Select a model before sending a message".to_string(),
                });
                return TurnOutcome::NoModel;
            }
            TurnStart::Busy => {
                tracing::debug!("[generation] Turn already in flight, prompt ignored");
                return TurnOutcome::Ignored;
            }
            TurnStart::Started {
                model_id,
                session_id,
            } => (model_id, session_id),
        };

        self.events.publish(AppEvent::MessageAppended {
            session_id: session_id.clone(),
            message: user_message,
        });
        self.events.publish(AppEvent::TurnStarted {
            session_id: session_id.clone(),
        });

        let request = GenerationRequest {
            model: model_id,
            prompt: prompt.to_string(),
            session_id: session_id.clone(),
        };
        let result = self.generate_with_timeout(request).await;
        let outcome = self.settle(&session_id, result).await;

        self.sessions.finish_turn(&session_id).await;
        self.events.publish(AppEvent::TurnSettled { session_id });
        outcome
    }

    async fn generate_with_timeout(&self, request: GenerationRequest) -> Result<GenerationResult> {
        match tokio::time::timeout(self.timeout, self.backend.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(PrefchatError::timeout("generation", self.timeout.as_secs())),
        }
    }

    async fn settle(&self, session_id: &str, result: Result<GenerationResult>) -> TurnOutcome {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                if !self.sessions.is_current(session_id).await {
                    tracing::info!(
                        "[generation] Dropping error for replaced session {}: {}",
                        session_id,
                        err
                    );
                    return TurnOutcome::Discarded;
                }
                tracing::error!("[generation] Turn failed: {}", err);
                self.events.publish(AppEvent::Error {
                    message: err.to_string(),
                });
                return TurnOutcome::Failed(err);
            }
        };

        let bot_message = Message::bot(result.message.content.clone());
        if !self
            .sessions
            .append_to(session_id, bot_message.clone())
            .await
        {
            tracing::info!(
                "[generation] Dropping response for replaced session {}",
                session_id
            );
            return TurnOutcome::Discarded;
        }
        self.events.publish(AppEvent::MessageAppended {
            session_id: session_id.to_string(),
            message: bot_message,
        });

        let Some(command) = result.proposed_command() else {
            return TurnOutcome::Completed { armed: None };
        };
        let _admission = self.admission.lock().await;
        match self.gate.arm(command).await {
            Ok(()) => {
                self.events.publish(AppEvent::CommandArmed {
                    command: command.to_string(),
                });
                TurnOutcome::Completed {
                    armed: Some(command.to_string()),
                }
            }
            Err(err) => {
                self.events.publish(AppEvent::Warning {
                    message: format!("Proposed command '{command}' was not queued: {err}"),
                });
                TurnOutcome::Completed { armed: None }
            }
        }
    }
}
