//! Error types for the Prefchat application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Prefchat application.
///
/// Every variant carries owned data only, so errors can be cloned into
/// application events and shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrefchatError {
    /// The backend could not be reached (connection refused, DNS, TLS, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an error status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A confirmed command could not be executed
    #[error("Command execution error: {0}")]
    Execution(String),

    /// The executor refused a command that is not on its allow-list
    #[error("Unauthorized command: {0}")]
    Unauthorized(String),

    /// An operation did not settle in time
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// An operation was invoked in a state that does not permit it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrefchatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns true when retrying the same call later may succeed.
    ///
    /// Covers transport failures, timeouts, and 5xx/429 backend answers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PrefchatError {
    fn from(err: std::io::Error) -> Self {
        Self::Execution(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for PrefchatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PrefchatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PrefchatError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for PrefchatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<String> for PrefchatError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, PrefchatError>`.
pub type Result<T> = std::result::Result<T, PrefchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(PrefchatError::transport("refused").is_retryable());
        assert!(PrefchatError::timeout("generate", 5).is_retryable());
        assert!(PrefchatError::backend(503, "busy").is_retryable());
        assert!(PrefchatError::backend(429, "slow down").is_retryable());
        assert!(!PrefchatError::backend(400, "bad request").is_retryable());
        assert!(!PrefchatError::unauthorized("rm").is_retryable());
    }

    #[test]
    fn test_timeout_message() {
        let err = PrefchatError::timeout("generation", 120);
        assert_eq!(err.to_string(), "generation timed out after 120s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: PrefchatError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, PrefchatError::Serialization { ref format, .. } if format == "JSON"));
    }
}
