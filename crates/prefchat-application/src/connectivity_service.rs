//! Connectivity Monitor.

use std::sync::Arc;

use prefchat_core::backend::LivenessProbe;
use prefchat_core::connectivity::ConnectivityState;
use prefchat_core::event::AppEvent;
use tokio::sync::RwLock;

use crate::events::EventPublisher;

/// Tracks whether the supporting preference service is reachable.
///
/// Being offline never blocks an operation; the front end shows a
/// degraded-mode banner while [`ConnectivityMonitor::is_degraded`] is true.
pub struct ConnectivityMonitor {
    probe: Arc<dyn LivenessProbe>,
    state: RwLock<Option<ConnectivityState>>,
    events: EventPublisher,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn LivenessProbe>, events: EventPublisher) -> Self {
        Self {
            probe,
            state: RwLock::new(None),
            events,
        }
    }

    /// Checks liveness and records the result.
    ///
    /// `ConnectivityChanged` is published on the first probe and whenever the
    /// value flips.
    pub async fn probe(&self) -> bool {
        let online = self.probe.check_liveness().await;
        let previous = self
            .state
            .write()
            .await
            .replace(ConnectivityState::new(online));

        if previous.map(|s| s.online) != Some(online) {
            if online {
                tracing::info!("[connectivity] Backend reachable");
            } else {
                tracing::warn!("[connectivity] Backend unreachable, running degraded");
            }
            self.events.publish(AppEvent::ConnectivityChanged { online });
        }
        online
    }

    /// Last recorded state, `None` before the first probe.
    pub async fn state(&self) -> Option<ConnectivityState> {
        *self.state.read().await
    }

    pub async fn is_degraded(&self) -> bool {
        self.state
            .read()
            .await
            .is_some_and(|s| s.is_degraded())
    }
}
