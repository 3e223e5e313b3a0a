//! Model catalog backed by a local Ollama server (`GET /api/tags`).

use std::time::Duration;

use async_trait::async_trait;
use prefchat_core::backend::ModelCatalog;
use prefchat_core::error::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::http::{build_client, check_status, join_url, map_request_error};

pub struct OllamaModelCatalog {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaModelCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl ModelCatalog for OllamaModelCatalog {
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, "/api/tags");
        tracing::debug!("[catalog] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| map_request_error("list models", self.timeout, err))?;
        let tags: TagsResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| map_request_error("list models", self.timeout, err))?;

        let mut models: Vec<String> = Vec::with_capacity(tags.models.len());
        for tag in tags.models {
            if !models.contains(&tag.name) {
                models.push(tag.name);
            }
        }
        tracing::info!("[catalog] {} model(s) available", models.len());
        Ok(models)
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}
