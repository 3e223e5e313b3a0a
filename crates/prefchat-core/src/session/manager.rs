use std::sync::Arc;

use tokio::sync::RwLock;

use super::message::Message;
use super::model::Session;
use crate::error::{PrefchatError, Result};

/// Outcome of trying to open a new turn on the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStart {
    /// No model has been selected yet.
    NoModel,
    /// A turn is already outstanding on the active session.
    Busy,
    /// The user message was appended and the session is now in flight.
    Started { model_id: String, session_id: String },
}

/// Owns the currently selected model, its conversation identity, and the
/// message log.
///
/// `SessionManager` is the only component that mutates a [`Session`]. Every
/// mutation that belongs to a particular turn is addressed by `session_id`,
/// so work issued against a session that has since been replaced by a model
/// switch cannot touch the new one.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    active: Arc<RwLock<Option<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a fresh conversation to `model_id` and returns its session id.
    ///
    /// The id is not validated against the catalog; callers only offer
    /// catalog members. History is never carried across selections.
    pub async fn select_model(&self, model_id: impl Into<String>) -> String {
        let session = Session::new(model_id);
        let session_id = session.session_id.clone();
        tracing::info!(
            "[session] Selected model '{}' (session {})",
            session.model_id,
            session_id
        );
        *self.active.write().await = Some(session);
        session_id
    }

    /// Appends `message` to the active session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when no model has been selected.
    pub async fn append_message(&self, message: Message) -> Result<()> {
        let mut guard = self.active.write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| PrefchatError::invalid_state("No model selected"))?;
        session.messages.push(message);
        Ok(())
    }

    /// Appends `message` only if `session_id` is still the active session.
    ///
    /// Returns `false` when the message was discarded.
    pub async fn append_to(&self, session_id: &str, message: Message) -> bool {
        let mut guard = self.active.write().await;
        match guard.as_mut() {
            Some(session) if session.session_id == session_id => {
                session.messages.push(message);
                true
            }
            _ => false,
        }
    }

    /// Atomically checks the turn preconditions, appends the user message,
    /// and marks the session in flight.
    ///
    /// Nothing is mutated unless `TurnStart::Started` is returned.
    pub async fn begin_turn(&self, user_message: Message) -> TurnStart {
        let mut guard = self.active.write().await;
        let Some(session) = guard.as_mut() else {
            return TurnStart::NoModel;
        };
        if session.turn_in_flight {
            return TurnStart::Busy;
        }
        session.messages.push(user_message);
        session.turn_in_flight = true;
        TurnStart::Started {
            model_id: session.model_id.clone(),
            session_id: session.session_id.clone(),
        }
    }

    /// Clears the in-flight flag of `session_id` if it is still active.
    pub async fn finish_turn(&self, session_id: &str) {
        let mut guard = self.active.write().await;
        if let Some(session) = guard.as_mut()
            && session.session_id == session_id
        {
            session.turn_in_flight = false;
        }
    }

    /// Returns a copy of the active session.
    pub async fn current(&self) -> Option<Session> {
        self.active.read().await.clone()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|s| s.session_id.clone())
    }

    pub async fn model_id(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|s| s.model_id.clone())
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    pub async fn is_turn_in_flight(&self) -> bool {
        self.active
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.turn_in_flight)
    }

    /// Returns true if `session_id` names the active session.
    pub async fn is_current(&self, session_id: &str) -> bool {
        self.active
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.session_id == session_id)
    }
}
