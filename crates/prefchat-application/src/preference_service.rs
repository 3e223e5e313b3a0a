//! Preference Snapshot Client.

use std::sync::Arc;

use prefchat_core::backend::PreferenceBackend;
use prefchat_core::error::Result;
use prefchat_core::event::AppEvent;
use prefchat_core::preference::{PreferenceSnapshot, SnapshotStore};

use crate::events::EventPublisher;

/// Keeps the read-only preference snapshot in sync with the backend.
///
/// This is the only writer of the [`SnapshotStore`]. A successful fetch
/// replaces the snapshot wholesale; a failed one leaves the previous snapshot
/// in place. When a fetch fails before any snapshot was loaded, the local
/// defaults (if configured) are stored instead.
pub struct PreferenceSnapshotClient {
    backend: Arc<dyn PreferenceBackend>,
    store: SnapshotStore,
    events: EventPublisher,
    defaults: Option<PreferenceSnapshot>,
}

impl PreferenceSnapshotClient {
    pub fn new(
        backend: Arc<dyn PreferenceBackend>,
        store: SnapshotStore,
        events: EventPublisher,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            defaults: None,
        }
    }

    pub fn with_defaults(mut self, defaults: PreferenceSnapshot) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub async fn fetch_snapshot(&self) -> Result<Arc<PreferenceSnapshot>> {
        let snapshot = match self.backend.fetch_preferences().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let kept = self.store.get().await.map_or(0, |s| s.len());
                tracing::warn!(
                    "[preferences] Fetch failed, keeping previous snapshot ({} settings): {}",
                    kept,
                    err
                );
                self.events.publish(AppEvent::Warning {
                    message: format!("Could not load preferences: {err}"),
                });
                self.seed_defaults().await;
                return Err(err);
            }
        };

        let settings = snapshot.len();
        self.store.replace(snapshot).await;
        tracing::info!("[preferences] Snapshot replaced ({} settings)", settings);
        self.events
            .publish(AppEvent::PreferencesUpdated { settings });

        Ok(self.store.get().await.unwrap_or_default())
    }

    async fn seed_defaults(&self) {
        let Some(defaults) = &self.defaults else {
            return;
        };
        let settings = defaults.len();
        if self.store.seed(defaults.clone()).await {
            tracing::info!("[preferences] Using {} default settings", settings);
            self.events
                .publish(AppEvent::PreferencesUpdated { settings });
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<PreferenceSnapshot>> {
        self.store.get().await
    }

    /// A read handle on the snapshot for other components.
    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }
}
