//! Generation backend that turns a chat with an Ollama model into an
//! optional preference command.
//!
//! Only the most recent `session_id` keeps a chat history: starting a new
//! session drops the previous one. The first turn of a session sends a
//! system prompt embedding the platform-filtered preference snapshot; every
//! user prompt is prefixed with the setting snippet that best matches it.

use std::time::Duration;

use async_trait::async_trait;
use prefchat_core::backend::{
    GenerationBackend, GenerationRequest, GenerationResult, ResponseMessage,
};
use prefchat_core::error::{PrefchatError, Result};
use prefchat_core::preference::{Platform, PreferenceSnapshot, SnapshotStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::http::{build_client, check_status, join_url, map_request_error};
use crate::prompt::{find_best_match, parse_model_reply, system_prompt};

#[derive(Default, Clone)]
struct SessionHistory {
    messages: Vec<ChatMessage>,
    last_snippet: Option<String>,
}

struct ActiveHistory {
    session_id: String,
    history: SessionHistory,
}

pub struct OllamaGenerationBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
    platform: Option<Platform>,
    snapshot: SnapshotStore,
    history_limit: usize,
    active: Mutex<Option<ActiveHistory>>,
}

impl OllamaGenerationBackend {
    /// Creates a backend reading preferences from `snapshot`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        platform: Option<Platform>,
        snapshot: SnapshotStore,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
            platform,
            snapshot,
            history_limit: 50,
            active: Mutex::new(None),
        })
    }

    /// Sets how many chat messages are kept per session (system prompt excluded).
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit.max(2);
        self
    }

    /// The session whose chat history is currently kept, if any.
    pub async fn active_session(&self) -> Option<String> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session_id.clone())
    }

    /// Returns the history of `session_id`, evicting any other session's.
    async fn open_history(&self, session_id: &str) -> SessionHistory {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(current) if current.session_id == session_id => current.history.clone(),
            _ => {
                if let Some(previous) = active.as_ref() {
                    tracing::debug!(
                        "[generation] Dropping history of session {}",
                        previous.session_id
                    );
                }
                *active = Some(ActiveHistory {
                    session_id: session_id.to_string(),
                    history: SessionHistory::default(),
                });
                SessionHistory::default()
            }
        }
    }

    /// Stores `history` unless another session took over meanwhile.
    async fn save_history(&self, session_id: &str, history: SessionHistory) {
        let mut active = self.active.lock().await;
        match active.as_mut() {
            Some(current) if current.session_id == session_id => current.history = history,
            _ => tracing::debug!(
                "[generation] Session {} was replaced, history not kept",
                session_id
            ),
        }
    }

    async fn reference_snapshot(&self) -> PreferenceSnapshot {
        let snapshot = self.snapshot.get().await.map(|s| (*s).clone()).unwrap_or_default();
        match self.platform {
            Some(platform) => snapshot.filtered_for(platform),
            None => snapshot,
        }
    }

    async fn send_chat(&self, body: &ChatRequest) -> Result<ChatResponse> {
        let url = join_url(&self.base_url, "/api/chat");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| map_request_error("generation", self.timeout, err))?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| map_request_error("generation", self.timeout, err))
    }

    fn trim_history(&self, history: &mut SessionHistory) {
        let has_system = history
            .messages
            .first()
            .is_some_and(|m| m.role == "system");
        let keep_from = usize::from(has_system);
        let chat_len = history.messages.len() - keep_from;
        if chat_len > self.history_limit {
            let excess = chat_len - self.history_limit;
            history.messages.drain(keep_from..keep_from + excess);
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaGenerationBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let reference = self.reference_snapshot().await;
        let reference_json = serde_json::to_string_pretty(&reference)?;

        let mut history = self.open_history(&request.session_id).await;

        if history.messages.is_empty() {
            tracing::debug!(
                "[generation] Opening session {} with system prompt",
                request.session_id
            );
            history.messages.push(ChatMessage {
                role: "system".to_string(),
                content: system_prompt(self.platform, &reference_json),
            });
        }

        let snippet = match find_best_match(&request.prompt, &reference, self.platform) {
            Some(name) => {
                tracing::debug!("[generation] Best match for '{}': {}", request.prompt, name);
                let snippet = setting_snippet(&name, &reference);
                history.last_snippet = snippet.clone();
                snippet
            }
            None => history.last_snippet.clone(),
        }
        .unwrap_or_else(|| reference_json.clone());

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: format!("{}\n\n {}", snippet, request.prompt),
        };
        let mut messages = history.messages.clone();
        messages.push(user_message.clone());

        let body = ChatRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            format: Some("json".to_string()),
        };
        let response = self.send_chat(&body).await?;
        let raw = response.message.ok_or_else(|| {
            PrefchatError::backend(502, "Generation response contained no message")
        })?;
        let reply = parse_model_reply(&raw.content)?;

        history.messages.push(user_message);
        history.messages.push(raw.clone());
        self.trim_history(&mut history);
        self.save_history(&request.session_id, history).await;

        let command = Some(reply.command.trim().to_string()).filter(|c| !c.is_empty());
        tracing::info!(
            "[generation] Session {} answered{}",
            request.session_id,
            if command.is_some() { " with a command" } else { "" }
        );

        Ok(GenerationResult {
            message: ResponseMessage {
                role: raw.role,
                content: reply.message,
            },
            command,
        })
    }

    async fn end_session(&self, session_id: &str) {
        let mut active = self.active.lock().await;
        if active
            .as_ref()
            .is_some_and(|current| current.session_id == session_id)
        {
            tracing::debug!("[generation] Session {} ended", session_id);
            *active = None;
        }
    }
}

/// Renders `{ name: setting }` as pretty JSON.
fn setting_snippet(name: &str, snapshot: &PreferenceSnapshot) -> Option<String> {
    let setting = snapshot.get(name)?;
    let mut object = serde_json::Map::new();
    object.insert(name.to_string(), serde_json::to_value(setting).ok()?);
    serde_json::to_string_pretty(&object).ok()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
}
