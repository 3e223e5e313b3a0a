//! Preference snapshot model.
//!
//! A snapshot is the read-only mapping of setting name to descriptor that the
//! preference backend owns. It is replaced wholesale on every successful
//! fetch and never patched in place.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::PrefchatError;

/// Desktop platforms a setting can carry a command for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Gnome,
}

impl Platform {
    /// Detects the platform this process runs on.
    ///
    /// On Linux only GNOME sessions are recognised; any other desktop
    /// yields `None`.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "windows") {
            return Some(Self::Windows);
        }
        if cfg!(target_os = "macos") {
            return Some(Self::Macos);
        }
        ["XDG_CURRENT_DESKTOP", "DESKTOP_SESSION"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| value.to_lowercase().contains("gnome"))
            .map(|_| Self::Gnome)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Gnome => "gnome",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PrefchatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Macos),
            "gnome" => Ok(Self::Gnome),
            other => Err(PrefchatError::config(format!("Unknown platform '{other}'"))),
        }
    }
}

/// Current value of a setting.
///
/// Order matters for untagged decoding: JSON booleans and numbers are tried
/// before falling back to strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    /// Parses `raw` into the same kind of value as `self`.
    ///
    /// Falls back to `Text` when `raw` does not parse as that kind.
    pub fn parse_like(&self, raw: &str) -> SettingValue {
        let raw = raw.trim().trim_matches('\'').trim_matches('"');
        match self {
            Self::Bool(_) => raw
                .parse::<bool>()
                .map(Self::Bool)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            Self::Number(_) => raw
                .parse::<f64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            Self::Text(_) => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Per-platform command bases for a setting. Empty means unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCommands {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub windows: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub macos: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gnome: String,
}

impl PlatformCommands {
    /// Returns the trimmed command base for `platform`, if any.
    pub fn command_for(&self, platform: Platform) -> Option<&str> {
        let command = match platform {
            Platform::Windows => &self.windows,
            Platform::Macos => &self.macos,
            Platform::Gnome => &self.gnome,
        }
        .trim();
        (!command.is_empty()).then_some(command)
    }

    /// Keeps only the command for `platform`.
    pub fn only(&self, platform: Platform) -> Self {
        let mut filtered = Self::default();
        let command = self.command_for(platform).unwrap_or_default().to_string();
        match platform {
            Platform::Windows => filtered.windows = command,
            Platform::Macos => filtered.macos = command,
            Platform::Gnome => filtered.gnome = command,
        }
        filtered
    }
}

/// Descriptor of one preference setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSetting {
    pub current: SettingValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    #[serde(default)]
    pub commands: PlatformCommands,
}

/// Read-only mapping of setting name to descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSnapshot {
    settings: BTreeMap<String, PreferenceSetting>,
}

impl PreferenceSnapshot {
    pub fn new(settings: BTreeMap<String, PreferenceSetting>) -> Self {
        Self { settings }
    }

    pub fn get(&self, name: &str) -> Option<&PreferenceSetting> {
        self.settings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PreferenceSetting)> {
        self.settings.iter()
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Copy of the snapshot carrying only `platform`'s commands.
    pub fn filtered_for(&self, platform: Platform) -> Self {
        let settings = self
            .settings
            .iter()
            .map(|(name, setting)| {
                let mut setting = setting.clone();
                setting.commands = setting.commands.only(platform);
                (name.clone(), setting)
            })
            .collect();
        Self { settings }
    }

    /// Finds the setting whose `platform` command base equals `base`.
    pub fn find_by_command(&self, platform: Platform, base: &str) -> Option<&str> {
        let base = base.trim();
        self.settings
            .iter()
            .find(|(_, s)| s.commands.command_for(platform) == Some(base))
            .map(|(name, _)| name.as_str())
    }

    /// Copy of the snapshot with `name`'s current value replaced.
    ///
    /// Returns `None` when `name` is not part of the snapshot.
    pub fn with_current(&self, name: &str, value: SettingValue) -> Option<Self> {
        let mut settings = self.settings.clone();
        settings.get_mut(name)?.current = value;
        Some(Self { settings })
    }
}

/// Wire shape of the preference payload: wrapped or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PreferencesPayload {
    Wrapped { preferences: PreferenceSnapshot },
    Bare(PreferenceSnapshot),
}

impl From<PreferencesPayload> for PreferenceSnapshot {
    fn from(payload: PreferencesPayload) -> Self {
        match payload {
            PreferencesPayload::Wrapped { preferences } => preferences,
            PreferencesPayload::Bare(snapshot) => snapshot,
        }
    }
}

/// Shared holder of the most recent snapshot.
///
/// Only the preference snapshot client calls [`SnapshotStore::replace`];
/// every other holder of a clone reads.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<Arc<PreferenceSnapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Arc<PreferenceSnapshot>> {
        self.inner.read().await.clone()
    }

    /// Swaps in `snapshot` as a whole.
    pub async fn replace(&self, snapshot: PreferenceSnapshot) {
        *self.inner.write().await = Some(Arc::new(snapshot));
    }

    /// Stores `snapshot` only if nothing was loaded yet. Returns whether it
    /// was stored.
    pub async fn seed(&self, snapshot: PreferenceSnapshot) -> bool {
        let mut inner = self.inner.write().await;
        if inner.is_some() {
            return false;
        }
        *inner = Some(Arc::new(snapshot));
        true
    }
}
