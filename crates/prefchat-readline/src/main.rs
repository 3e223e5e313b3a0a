mod helper;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc;

use prefchat_application::{AgentApp, AppBackends, Refresh, events};
use prefchat_core::config::RootConfig;
use prefchat_core::preference::SnapshotStore;
use prefchat_execution::{ShellCommandExecutor, init_logging};
use prefchat_infrastructure::{ConfigService, PrefchatPaths, load_default_preferences};
use prefchat_interaction::{
    HttpLivenessProbe, HttpPreferenceBackend, OllamaGenerationBackend, OllamaModelCatalog,
};

use helper::CliHelper;

const CONNECTIVITY_INTERVAL: Duration = Duration::from_secs(30);

/// Chat with a local model to change accessibility preferences.
#[derive(Parser, Debug)]
#[command(name = "prefchat", version, about)]
struct Args {
    /// Configuration file (default: ~/.config/prefchat/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model to select at startup, if the catalog offers it
    #[arg(long)]
    model: Option<String>,

    /// Log filter, e.g. "debug" or "prefchat_interaction=trace"
    #[arg(long)]
    log_level: Option<String>,
}

fn build_app(config: &RootConfig, events: events::EventPublisher) -> Result<AgentApp> {
    let backend = &config.backend;
    let request_timeout = Duration::from_secs(backend.request_timeout_secs);
    let generation_timeout = Duration::from_secs(config.generation.timeout_secs);
    let platform = config
        .executor
        .resolve_platform()
        .context("Invalid [executor] platform")?;
    if platform.is_none() {
        tracing::warn!("[app] No supported desktop detected; commands will be refused");
    }
    let username = config.user.resolve_name();
    let snapshot = SnapshotStore::new();

    let preferences = Arc::new(HttpPreferenceBackend::new(
        &backend.server_url,
        username,
        request_timeout,
    )?);
    let executor = ShellCommandExecutor::new(platform, snapshot.clone(), preferences.clone())
        .with_allow_list(config.executor.enforce_allow_list);
    let generation = OllamaGenerationBackend::new(
        &backend.ollama_url,
        generation_timeout,
        platform,
        snapshot.clone(),
    )?
    .with_history_limit(config.generation.history_limit);

    let backends = AppBackends {
        catalog: Arc::new(OllamaModelCatalog::new(&backend.ollama_url, request_timeout)?),
        generation: Arc::new(generation),
        preferences,
        liveness: Arc::new(HttpLivenessProbe::new(
            &backend.server_url,
            &backend.liveness_path,
            request_timeout,
        )?),
        executor: Arc::new(executor),
    };
    let app = AgentApp::new(backends, snapshot, generation_timeout, events);

    let defaults_path = config.preferences.defaults_path();
    match load_default_preferences(defaults_path.as_deref()) {
        Ok(defaults) => Ok(app.with_default_preferences(defaults)),
        Err(err) => {
            tracing::warn!("[app] No default preferences: {}", err);
            Ok(app)
        }
    }
}

async fn print_status(app: &AgentApp) {
    match app.session().await {
        Some(session) => println!(
            "Model: {}  Session: {}  Messages: {}{}",
            session.model_id.magenta(),
            session.session_id,
            session.messages.len(),
            if session.turn_in_flight { "  (waiting for reply)" } else { "" }
        ),
        None => println!("{}", "No model selected. Use /model <id>.".yellow()),
    }
    if let Some(pending) = app.pending_command().await {
        println!("Pending command: {}", pending.text.yellow().bold());
    }
    match app.connectivity().await {
        Some(state) if state.online => println!(
            "Preference service: {} (checked {})",
            "online".green(),
            state.last_checked.format("%H:%M:%S")
        ),
        Some(state) => println!(
            "Preference service: {} (checked {})",
            "offline".red(),
            state.last_checked.format("%H:%M:%S")
        ),
        None => println!("Preference service: unknown"),
    }
}

/// Handles a slash command. Returns false for unknown commands.
async fn handle_command(
    app: &AgentApp,
    rl: &mut Editor<CliHelper, DefaultHistory>,
    line: &str,
) -> bool {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "/help" => render::print_help(),
        "/models" => {
            app.on_demand(Refresh::Models).await;
            if let Some(helper) = rl.helper_mut() {
                helper.set_models(app.models().await);
            }
        }
        "/model" if arg.is_empty() => println!("{}", "Usage: /model <id>".yellow()),
        "/model" => {
            if app.has_model(arg).await {
                app.select_model(arg).await;
            } else {
                println!("{}", format!("Unknown model '{arg}'. See /models.").yellow());
            }
        }
        "/prefs" => {
            app.on_demand(Refresh::Preferences).await;
            match app.preferences().await {
                Some(snapshot) => render::print_preferences(&snapshot),
                None => println!("{}", "No preferences loaded.".yellow()),
            }
        }
        "/status" => print_status(app).await,
        "/refresh" => {
            app.on_demand(Refresh::Models).await;
            app.on_demand(Refresh::Preferences).await;
            app.on_demand(Refresh::Connectivity).await;
        }
        "/yes" => {
            if app.confirm().await.is_none() {
                println!("{}", "Nothing to confirm.".bright_black());
            }
        }
        "/no" => {
            if app.cancel().await.is_none() {
                println!("{}", "Nothing to cancel.".bright_black());
            }
        }
        _ => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Configuration & logging =====
    let paths = PrefchatPaths::new(None);
    let config_service = match &args.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_paths(&paths)?,
    };
    let mut config = config_service.get_config();
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let logs_dir = paths
        .logs_dir(&config.logging.directory)
        .context("Failed to resolve log directory")?;
    let (diag_tx, mut diag_rx) = mpsc::unbounded_channel();
    let _log_guard = init_logging(&config.logging, &logs_dir, Some(diag_tx))?;
    tracing::info!("[app] Config: {}", config_service.path().display());

    // ===== Application =====
    let (publisher, mut event_rx) = events::channel();
    let app = Arc::new(build_app(&config, publisher)?);

    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => render::print_event(&event),
                Some(diagnostic) = diag_rx.recv() => {
                    // other components report through AppEvents already
                    if diagnostic.target.starts_with("prefchat_execution") {
                        render::print_diagnostic(&diagnostic);
                    }
                }
                else => break,
            }
        }
    });

    app.on_start().await;
    if let Some(model) = args.model.as_deref() {
        if app.has_model(model).await {
            app.select_model(model).await;
        } else {
            println!("{}", format!("Model '{model}' is not available.").yellow());
        }
    }

    let monitor = {
        let app = app.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CONNECTIVITY_INTERVAL);
            // the first tick fires immediately and on_start already probed
            interval.tick().await;
            loop {
                interval.tick().await;
                app.on_demand(Refresh::Connectivity).await;
            }
        })
    };

    // ===== REPL Setup =====
    let mut helper = CliHelper::new();
    helper.set_models(app.models().await);
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== prefchat ===".bright_magenta().bold());
    println!(
        "{}",
        "Pick a model with /model <id>, then describe what you'd like to change. /help lists commands."
            .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let prompt = if app.is_degraded().await {
            "[offline] >> "
        } else {
            ">> "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    if !handle_command(&app, &mut rl, trimmed).await {
                        println!("{}", "Unknown command. Type /help.".bright_black());
                    }
                    continue;
                }

                if let Some(pending) = app.pending_command().await {
                    println!(
                        "{}",
                        format!("Answer /yes or /no for '{}' first.", pending.text).bright_yellow()
                    );
                    continue;
                }

                println!("{}", format!("> {}", trimmed).green());
                let app = app.clone();
                let input = trimmed.to_string();
                tokio::spawn(async move {
                    app.submit(&input).await;
                });
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    monitor.abort();
    printer.abort();

    Ok(())
}
