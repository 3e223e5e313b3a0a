pub mod backend;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod event;
pub mod preference;
pub mod ready;
pub mod session;

// Re-export common error type
pub use error::PrefchatError;
