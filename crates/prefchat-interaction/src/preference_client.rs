//! Client for the preference server.

use std::time::Duration;

use async_trait::async_trait;
use prefchat_core::backend::PreferenceBackend;
use prefchat_core::error::Result;
use prefchat_core::preference::{PreferenceSnapshot, PreferencesPayload};
use reqwest::Client;
use serde::Serialize;

use crate::http::{build_client, check_status, join_url, map_request_error};

/// Reads a user's preferences from `GET {server_url}/preferences/{username}`
/// and stores them with `POST {server_url}/preferences/update`.
pub struct HttpPreferenceBackend {
    client: Client,
    server_url: String,
    username: String,
    timeout: Duration,
}

impl HttpPreferenceBackend {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            server_url: server_url.into(),
            username: username.into(),
            timeout,
        })
    }

    fn fetch_url(&self) -> String {
        join_url(&self.server_url, &format!("/preferences/{}", self.username))
    }

    fn update_url(&self) -> String {
        join_url(&self.server_url, "/preferences/update")
    }
}

#[derive(Serialize)]
struct UpdatePreferencesRequest<'a> {
    username: &'a str,
    preferences: &'a PreferenceSnapshot,
}

#[async_trait]
impl PreferenceBackend for HttpPreferenceBackend {
    async fn fetch_preferences(&self) -> Result<PreferenceSnapshot> {
        let url = self.fetch_url();
        tracing::debug!("[preferences] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| map_request_error("fetch preferences", self.timeout, err))?;
        let payload: PreferencesPayload = check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| map_request_error("fetch preferences", self.timeout, err))?;
        Ok(payload.into())
    }

    async fn store_preferences(&self, snapshot: &PreferenceSnapshot) -> Result<()> {
        let url = self.update_url();
        tracing::debug!("[preferences] POST {} for {}", url, self.username);

        let response = self
            .client
            .post(&url)
            .json(&UpdatePreferencesRequest {
                username: &self.username,
                preferences: snapshot,
            })
            .send()
            .await
            .map_err(|err| map_request_error("store preferences", self.timeout, err))?;
        check_status(response).await?;
        Ok(())
    }
}
