//! Liveness probe of the preference/encryption service.

use std::time::Duration;

use async_trait::async_trait;
use prefchat_core::backend::LivenessProbe;
use prefchat_core::error::Result;
use reqwest::Client;

use crate::http::{build_client, join_url};

pub struct HttpLivenessProbe {
    client: Client,
    url: String,
}

impl HttpLivenessProbe {
    pub fn new(server_url: &str, liveness_path: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: join_url(server_url, liveness_path),
        })
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn check_liveness(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!("[liveness] {} answered {}", self.url, response.status());
                false
            }
            Err(err) => {
                tracing::debug!("[liveness] {} unreachable: {}", self.url, err);
                false
            }
        }
    }
}
