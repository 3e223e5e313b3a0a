//! Composition root of the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use prefchat_core::backend::{
    CommandExecutor, GenerationBackend, LivenessProbe, ModelCatalog, PreferenceBackend,
};
use prefchat_core::command::{CommandGate, CommandResolution, PendingCommand};
use prefchat_core::connectivity::ConnectivityState;
use prefchat_core::event::AppEvent;
use prefchat_core::preference::{PreferenceSnapshot, SnapshotStore};
use prefchat_core::ready::ReadySignal;
use prefchat_core::session::{Session, SessionManager};

use crate::catalog_service::ModelCatalogClient;
use crate::connectivity_service::ConnectivityMonitor;
use crate::events::EventPublisher;
use crate::generation_pipeline::{GenerationPipeline, TurnOutcome};
use crate::preference_service::PreferenceSnapshotClient;

/// The backends the application talks to.
pub struct AppBackends {
    pub catalog: Arc<dyn ModelCatalog>,
    pub generation: Arc<dyn GenerationBackend>,
    pub preferences: Arc<dyn PreferenceBackend>,
    pub liveness: Arc<dyn LivenessProbe>,
    pub executor: Arc<dyn CommandExecutor>,
}

/// What [`AgentApp::on_demand`] should refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Models,
    Preferences,
    Connectivity,
}

/// Owns the session, the command gate and the backend clients, and exposes
/// the user-facing operations.
///
/// There is exactly one [`CommandGate`] per `AgentApp`, created here and
/// shared by handle with the generation pipeline.
pub struct AgentApp {
    sessions: SessionManager,
    gate: Arc<CommandGate>,
    catalog: ModelCatalogClient,
    preferences: PreferenceSnapshotClient,
    connectivity: ConnectivityMonitor,
    pipeline: GenerationPipeline,
    ready: ReadySignal,
    events: EventPublisher,
}

impl AgentApp {
    /// `snapshot` must be the same store the backends that read preferences
    /// were built with; the app becomes its only writer.
    pub fn new(
        backends: AppBackends,
        snapshot: SnapshotStore,
        generation_timeout: Duration,
        events: EventPublisher,
    ) -> Self {
        let sessions = SessionManager::new();
        let gate = Arc::new(CommandGate::new(backends.executor));
        let pipeline = GenerationPipeline::new(
            sessions.clone(),
            backends.generation,
            gate.clone(),
            events.clone(),
            generation_timeout,
        );

        Self {
            sessions,
            gate,
            catalog: ModelCatalogClient::new(backends.catalog, events.clone()),
            preferences: PreferenceSnapshotClient::new(
                backends.preferences,
                snapshot,
                events.clone(),
            ),
            connectivity: ConnectivityMonitor::new(backends.liveness, events.clone()),
            pipeline,
            ready: ReadySignal::new(),
            events,
        }
    }

    /// Preferences to fall back on while the preference backend has never
    /// answered.
    pub fn with_default_preferences(mut self, defaults: PreferenceSnapshot) -> Self {
        self.preferences = self.preferences.with_defaults(defaults);
        self
    }

    /// Loads models, preferences and connectivity, then marks the app ready.
    ///
    /// None of the three failing stops startup.
    pub async fn on_start(&self) {
        tracing::info!("[app] Starting");
        let (models, prefs, online) = tokio::join!(
            self.catalog.list_models(),
            self.preferences.fetch_snapshot(),
            self.connectivity.probe(),
        );
        tracing::info!(
            "[app] Startup: models {}, preferences {}, backend {}",
            if models.is_ok() { "loaded" } else { "unavailable" },
            if prefs.is_ok() { "loaded" } else { "unavailable" },
            if online { "online" } else { "offline" },
        );

        if self.ready.emit() {
            self.events.publish(AppEvent::Ready);
        }
    }

    pub async fn on_demand(&self, refresh: Refresh) {
        tracing::debug!("[app] Refreshing {:?}", refresh);
        match refresh {
            Refresh::Models => {
                if let Err(err) = self.catalog.list_models().await {
                    tracing::debug!("[app] Model refresh failed: {}", err);
                }
            }
            Refresh::Preferences => {
                if let Err(err) = self.preferences.fetch_snapshot().await {
                    tracing::debug!("[app] Preference refresh failed: {}", err);
                }
            }
            Refresh::Connectivity => {
                self.connectivity.probe().await;
            }
        }
    }

    /// Starts a new session with `model_id` and returns its id.
    ///
    /// The replaced session, if any, is ended at the generation backend.
    pub async fn select_model(&self, model_id: &str) -> String {
        let previous = self.sessions.session_id().await;
        let session_id = self.sessions.select_model(model_id).await;
        if let Some(previous) = previous {
            self.pipeline.end_session(&previous).await;
        }
        self.events.publish(AppEvent::SessionStarted {
            model_id: model_id.to_string(),
            session_id: session_id.clone(),
        });
        session_id
    }

    pub async fn submit(&self, prompt: &str) -> TurnOutcome {
        self.pipeline.submit_turn(prompt).await
    }

    /// Runs the armed command, if any.
    ///
    /// After a successful run the preference snapshot is refetched so the
    /// read-only view shows the new value.
    pub async fn confirm(&self) -> Option<CommandResolution> {
        let resolution = self.gate.confirm().await?;
        self.events.publish(AppEvent::CommandResolved {
            command: resolution.command.clone(),
            outcome: resolution.outcome.clone(),
        });
        if resolution.is_executed() {
            self.on_demand(Refresh::Preferences).await;
        }
        Some(resolution)
    }

    /// Discards the armed command, if any.
    pub async fn cancel(&self) -> Option<String> {
        let command = self.gate.cancel().await?;
        self.events.publish(AppEvent::CommandCancelled {
            command: command.clone(),
        });
        Some(command)
    }

    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub async fn session(&self) -> Option<Session> {
        self.sessions.current().await
    }

    pub async fn pending_command(&self) -> Option<PendingCommand> {
        self.gate.pending().await
    }

    pub async fn models(&self) -> Vec<String> {
        self.catalog.models().await
    }

    pub async fn has_model(&self, model_id: &str) -> bool {
        self.catalog.contains(model_id).await
    }

    pub async fn preferences(&self) -> Option<Arc<PreferenceSnapshot>> {
        self.preferences.snapshot().await
    }

    pub async fn connectivity(&self) -> Option<ConnectivityState> {
        self.connectivity.state().await
    }

    pub async fn is_degraded(&self) -> bool {
        self.connectivity.is_degraded().await
    }
}
