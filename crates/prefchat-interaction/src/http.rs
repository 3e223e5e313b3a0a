//! Shared HTTP plumbing for the backend clients.

use std::time::Duration;

use prefchat_core::error::{PrefchatError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

/// Builds a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| PrefchatError::config(format!("Failed to build HTTP client: {err}")))
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Maps a transport-level failure of `operation`.
pub fn map_request_error(operation: &str, timeout: Duration, err: reqwest::Error) -> PrefchatError {
    if err.is_timeout() {
        PrefchatError::timeout(operation, timeout.as_secs())
    } else if err.is_decode() {
        PrefchatError::Serialization {
            format: "JSON".to_string(),
            message: format!("{operation}: {err}"),
        }
    } else {
        PrefchatError::transport(format!("{operation} request failed: {err}"))
    }
}

/// Passes successful responses through and turns the rest into
/// `PrefchatError::Backend` with the server's own message when it has one.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(status, body))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    // Ollama: {"error": "model 'x' not found"}
    Error { error: String },
    // FastAPI/Litestar style: {"detail": "..."}
    Detail { detail: String },
}

fn map_http_error(status: StatusCode, body: String) -> PrefchatError {
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody::Error { error }) => error,
        Ok(ErrorBody::Detail { detail }) => detail,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };
    PrefchatError::backend(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h:1/", "/api/tags"), "http://h:1/api/tags");
        assert_eq!(join_url("http://h:1", "api/tags"), "http://h:1/api/tags");
    }

    #[test]
    fn test_map_http_error_prefers_server_message() {
        let err = map_http_error(
            StatusCode::NOT_FOUND,
            r#"{"error":"model 'x' not found"}"#.to_string(),
        );
        assert_eq!(err, PrefchatError::backend(404, "model 'x' not found"));

        let err = map_http_error(StatusCode::BAD_GATEWAY, String::new());
        assert_eq!(err, PrefchatError::backend(502, "Bad Gateway"));

        let err = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert_eq!(err, PrefchatError::backend(500, "boom"));
    }
}
