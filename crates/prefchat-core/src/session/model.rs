//! Core session domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// One conversation bound to a single model.
///
/// A `Session` is created fresh every time a model is selected; it is never
/// reused, even when the same model is selected again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The model this conversation talks to.
    pub model_id: String,
    /// Unique identity token of this conversation (UUID v4).
    pub session_id: String,
    /// Append-only log in creation order.
    pub messages: Vec<Message>,
    /// True while a generation turn is outstanding.
    pub turn_in_flight: bool,
}

impl Session {
    /// Starts a new, empty conversation with `model_id`.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            turn_in_flight: false,
        }
    }
}
