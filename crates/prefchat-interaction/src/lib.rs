//! HTTP implementations of the backend traits.

pub mod http;
pub mod liveness_client;
pub mod ollama_catalog;
pub mod ollama_generation;
pub mod preference_client;
pub mod prompt;

pub use liveness_client::HttpLivenessProbe;
pub use ollama_catalog::OllamaModelCatalog;
pub use ollama_generation::OllamaGenerationBackend;
pub use preference_client::HttpPreferenceBackend;
