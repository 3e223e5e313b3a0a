//! Command authorization.
//!
//! A command proposed by the model is held by the [`CommandGate`] until the
//! user explicitly confirms or cancels it. Only a confirmation reaches the
//! executor.

mod gate;
mod pending;

pub use gate::CommandGate;
pub use pending::{CommandOutcome, CommandResolution, CommandState, PendingCommand};
