//! Model Catalog Client.

use std::sync::Arc;

use prefchat_core::backend::ModelCatalog;
use prefchat_core::error::Result;
use prefchat_core::event::AppEvent;
use tokio::sync::RwLock;

use crate::events::EventPublisher;

/// Fetches the selectable model identifiers and remembers the last list.
///
/// An empty list is a valid answer ("no models available"). A failed fetch
/// keeps the previous list and is reported as a warning.
pub struct ModelCatalogClient {
    catalog: Arc<dyn ModelCatalog>,
    models: RwLock<Vec<String>>,
    events: EventPublisher,
}

impl ModelCatalogClient {
    pub fn new(catalog: Arc<dyn ModelCatalog>, events: EventPublisher) -> Self {
        Self {
            catalog,
            models: RwLock::new(Vec::new()),
            events,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        match self.catalog.list_models().await {
            Ok(models) => {
                if models.is_empty() {
                    tracing::info!("[catalog] No models available");
                }
                *self.models.write().await = models.clone();
                self.events.publish(AppEvent::ModelsLoaded {
                    models: models.clone(),
                });
                Ok(models)
            }
            Err(err) => {
                tracing::warn!("[catalog] Failed to list models: {}", err);
                self.events.publish(AppEvent::Warning {
                    message: format!("Could not load the model list: {err}"),
                });
                Err(err)
            }
        }
    }

    /// The last successfully fetched list.
    pub async fn models(&self) -> Vec<String> {
        self.models.read().await.clone()
    }

    pub async fn contains(&self, model_id: &str) -> bool {
        self.models.read().await.iter().any(|m| m == model_id)
    }
}
