//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`Sender`, `Message`)
//! - `model`: The session bound to one selected model (`Session`)
//! - `manager`: Ownership of the active session (`SessionManager`)

mod manager;
mod message;
mod model;

// Re-export public API
pub use manager::{SessionManager, TurnStart};
pub use message::{Message, Sender};
pub use model::Session;
