//! Process-side plumbing: running confirmed commands and wiring up logging.

pub mod logging;
pub mod shell_executor;
pub mod tracing_layer;

pub use logging::init_logging;
pub use shell_executor::ShellCommandExecutor;
pub use tracing_layer::{DiagnosticEvent, DiagnosticLayer};
