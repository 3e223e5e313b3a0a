//! Backend liveness state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known reachability of the supporting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityState {
    pub online: bool,
    pub last_checked: DateTime<Utc>,
}

impl ConnectivityState {
    pub fn new(online: bool) -> Self {
        Self {
            online,
            last_checked: Utc::now(),
        }
    }

    /// Whether the UI should show the degraded-mode indicator.
    pub fn is_degraded(&self) -> bool {
        !self.online
    }
}
