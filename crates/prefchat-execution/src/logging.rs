//! Process-wide tracing setup.

use std::path::Path;

use anyhow::Context;
use prefchat_core::config::LoggingConfig;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::tracing_layer::{DiagnosticEvent, DiagnosticLayer};

pub const LOG_FILE_PREFIX: &str = "prefchat.log";

/// Installs the global subscriber.
///
/// Events go to a daily-rotated file in `logs_dir`. `RUST_LOG` overrides
/// `config.level`. When `diagnostics` is given, WARN and ERROR events are
/// also forwarded to it.
///
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logging(
    config: &LoggingConfig,
    logs_dir: &Path,
    diagnostics: Option<mpsc::UnboundedSender<DiagnosticEvent>>,
) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let diagnostic_layer =
        diagnostics.map(|tx| DiagnosticLayer::new(tx).with_filter(LevelFilter::WARN));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(diagnostic_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "[logging] Writing logs to {} (level {})",
        logs_dir.display(),
        config.level
    );
    Ok(guard)
}
