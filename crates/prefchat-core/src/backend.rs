//! Backend RPC surface consumed by the orchestrator.
//!
//! Each trait is one row of the backend contract. The HTTP clients live in
//! `prefchat-interaction`, the command executor in `prefchat-execution`;
//! tests substitute in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::preference::PreferenceSnapshot;

/// Request for one generation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub session_id: String,
}

/// The model's reply message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
}

/// Result of one generation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub message: ResponseMessage,
    /// System-modifying command proposed by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl GenerationResult {
    /// The proposed command, if present and not blank.
    pub fn proposed_command(&self) -> Option<&str> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Request handed to the executor after a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCommandRequest {
    pub command: String,
    /// Whether the new value should be stored by the preference backend.
    pub persist: bool,
}

/// Lists selectable model identifiers.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Returns model identifiers in backend order. An empty list is valid.
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Performs one request/response exchange with the model.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult>;

    /// Releases whatever the backend keeps for `session_id`. Called when the
    /// session is replaced.
    async fn end_session(&self, _session_id: &str) {}
}

/// Owns the canonical preference values.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    async fn fetch_preferences(&self) -> Result<PreferenceSnapshot>;

    /// Stores an updated mapping.
    async fn store_preferences(&self, snapshot: &PreferenceSnapshot) -> Result<()>;
}

/// Lightweight reachability check of the supporting service.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Returns `true` if the service answered. Never fails: unreachable is
    /// reported as `false`.
    async fn check_liveness(&self) -> bool;
}

/// Performs a confirmed command on the host.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, request: ExecuteCommandRequest) -> Result<()>;
}
