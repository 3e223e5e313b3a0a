//! Terminal rendering of application events.

use colored::Colorize;
use prefchat_core::command::CommandOutcome;
use prefchat_core::event::AppEvent;
use prefchat_core::preference::PreferenceSnapshot;
use prefchat_core::session::Sender;
use prefchat_execution::DiagnosticEvent;

pub fn print_event(event: &AppEvent) {
    match event {
        AppEvent::ModelsLoaded { models } if models.is_empty() => {
            println!("{}", "No models available.".yellow());
        }
        AppEvent::ModelsLoaded { models } => {
            println!("{}", "Available models:".bright_magenta());
            for model in models {
                println!("  {}", model.magenta());
            }
        }
        AppEvent::SessionStarted {
            model_id,
            session_id,
        } => {
            println!(
                "{}",
                format!("Chatting with {model_id} (session {session_id})").bright_black()
            );
        }
        AppEvent::MessageAppended { message, .. } => match message.sender {
            // echoed by the prompt already
            Sender::User => {}
            Sender::Bot => {
                for line in message.text.lines() {
                    println!("{}", line.bright_blue());
                }
            }
            Sender::System => println!("{}", message.text.bright_black()),
        },
        AppEvent::TurnStarted { .. } => println!("{}", "thinking...".bright_black()),
        AppEvent::TurnSettled { .. } => {}
        AppEvent::CommandArmed { command } => {
            println!("{}", "The assistant wants to run:".bright_yellow());
            println!("  {}", command.yellow().bold());
            println!("{}", "Run it? (/yes or /no)".bright_yellow());
        }
        AppEvent::CommandResolved { command, outcome } => match outcome {
            CommandOutcome::Executed => println!("{}", format!("Ran: {command}").green()),
            CommandOutcome::Failed { reason } => {
                println!("{}", format!("Command failed: {reason}").red());
            }
        },
        AppEvent::CommandCancelled { command } => {
            println!("{}", format!("Discarded: {command}").bright_black());
        }
        AppEvent::PreferencesUpdated { settings } => {
            println!("{}", format!("Loaded {settings} preference(s).").bright_black());
        }
        AppEvent::ConnectivityChanged { online: false } => {
            println!(
                "{}",
                "Preference service unreachable: running in degraded mode.".on_red().white()
            );
        }
        AppEvent::ConnectivityChanged { online: true } => {
            println!("{}", "Preference service reachable.".green());
        }
        AppEvent::Warning { message } => println!("{}", message.yellow()),
        AppEvent::Error { message } => eprintln!("{}", format!("Error: {message}").red()),
        AppEvent::Ready => println!("{}", "Ready.".bright_black()),
    }
}

pub fn print_diagnostic(event: &DiagnosticEvent) {
    println!(
        "{}",
        format!("[{}] {}", event.level, event.message).bright_black()
    );
}

pub fn print_preferences(snapshot: &PreferenceSnapshot) {
    if snapshot.is_empty() {
        println!("{}", "No preferences loaded.".yellow());
        return;
    }
    for (name, setting) in snapshot.iter() {
        let range = match (setting.lower_bound, setting.upper_bound) {
            (Some(lower), Some(upper)) => format!(" [{lower}..{upper}]"),
            _ => String::new(),
        };
        println!("  {}: {}{}", name.cyan(), setting.current, range.bright_black());
    }
}

pub fn print_help() {
    println!("{}", "Type a request to chat with the selected model.".bright_black());
    for (command, description) in [
        ("/models", "list available models"),
        ("/model <id>", "start a new chat with a model"),
        ("/prefs", "show current preferences"),
        ("/status", "show session, pending command and connectivity"),
        ("/refresh", "reload models, preferences and connectivity"),
        ("/yes", "run the pending command"),
        ("/no", "discard the pending command"),
        ("quit", "exit"),
    ] {
        println!("  {}{}", format!("{command:<14}").bright_cyan(), description.bright_black());
    }
}
