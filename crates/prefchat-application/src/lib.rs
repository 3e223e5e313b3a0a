//! Application layer: the orchestration services and their composition.
//!
//! [`AgentApp`] wires the Session Manager, the Command Authorization Gate and
//! the backend clients together and publishes [`prefchat_core::event::AppEvent`]s
//! for the front end.

pub mod app;
pub mod catalog_service;
pub mod connectivity_service;
pub mod events;
pub mod generation_pipeline;
pub mod preference_service;

pub use app::{AgentApp, AppBackends, Refresh};
pub use catalog_service::ModelCatalogClient;
pub use connectivity_service::ConnectivityMonitor;
pub use events::EventPublisher;
pub use generation_pipeline::{GenerationPipeline, TurnOutcome};
pub use preference_service::PreferenceSnapshotClient;
