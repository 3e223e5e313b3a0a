//! Local default preferences, used when the preference server cannot be
//! reached before any snapshot was loaded.

use std::fs;
use std::path::Path;

use prefchat_core::error::{PrefchatError, Result};
use prefchat_core::preference::{PreferenceSnapshot, PreferencesPayload};

const BUNDLED: &str = include_str!("../assets/default_preferences.json");

/// Loads the default preference mapping.
///
/// Reads `path` when given (wrapped or bare payload), otherwise the mapping
/// bundled with the binary.
pub fn load_default_preferences(path: Option<&Path>) -> Result<PreferenceSnapshot> {
    let (source, contents) = match path {
        Some(path) => (path.display().to_string(), fs::read_to_string(path)?),
        None => ("bundled defaults".to_string(), BUNDLED.to_string()),
    };
    let payload: PreferencesPayload = serde_json::from_str(&contents).map_err(|e| {
        PrefchatError::config(format!("Invalid default preferences in {source}: {e}"))
    })?;
    let snapshot = PreferenceSnapshot::from(payload);
    tracing::debug!(
        "[preferences] Loaded {} default settings from {}",
        snapshot.len(),
        source
    );
    Ok(snapshot)
}
