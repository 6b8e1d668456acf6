//! CLI entrypoint and subcommand orchestration.

mod config;
#[cfg(test)]
mod test_support;
mod tui;

use clap::{Parser, Subcommand};
use client::{KeyStatus, SessionController};
use proto::{ModelChoice, Role};

#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use anyhow::Context;
#[cfg(not(test))]
use client::HttpGateway;
#[cfg(not(test))]
use config::{Config, TuiState};
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments for the multichat client.
#[derive(Parser)]
#[command(name = "multichat")]
#[command(about = "Terminal client for the Multi-AI chatbot", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.multichat/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Chat backend base URL (overrides config and MULTICHAT_SERVER_URL)
    #[arg(long)]
    server: Option<String>,

    /// Model to chat with: gpt or gemini
    #[arg(short, long)]
    model: Option<ModelChoice>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen TUI (default when no subcommand is given)
    Tui,

    /// Send one message in a fresh chat and print the reply
    Ask {
        /// Message to send
        #[arg(short = 'e', long)]
        exec: String,
    },

    /// Save provider API keys on the backend
    Keys {
        /// OpenAI API key
        #[arg(long, default_value = "")]
        openai: String,

        /// Google API key
        #[arg(long, default_value = "")]
        google: String,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::Tui => "tui",
            Commands::Ask { .. } => "ask",
            Commands::Keys { .. } => "keys",
        }
    }
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine effective command (default to Tui if none given)
    let command = cli.command.unwrap_or(Commands::Tui);
    let is_tui = matches!(command, Commands::Tui);

    // Console output goes to a sink in TUI mode so the screen stays intact.
    // When --debug is passed, write debug-level logs to ~/.multichat/logs/debug.YYYY-MM-DD.log
    // using daily rotation so logs accumulate across sessions.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let log_dir = config::app_dir().join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new(
                    "debug,hyper_util=info,rustls=info,reqwest=info",
                ));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new(
                    "debug,hyper_util=info,rustls=info,reqwest=info",
                ));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    // Session-start marker for the debug log.
    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== multichat session start =========="
        );
    }

    // Load config
    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });
    apply_cli_overrides(&mut config, cli.server, cli.model);

    match command {
        Commands::Tui => cmd_tui(config, cli.model).await,
        Commands::Ask { exec } => cmd_ask(config, exec).await,
        Commands::Keys { openai, google } => cmd_keys(config, openai, google).await,
    }
}

/// Command-line flags win over the config file and environment.
fn apply_cli_overrides(
    config: &mut config::Config,
    server: Option<String>,
    model: Option<ModelChoice>,
) {
    if let Some(server) = server {
        config.server.base_url = server;
    }
    if let Some(model) = model {
        config.chat.model = model;
    }
}

/// `--model`, then the model remembered by the last TUI session, then config.
fn resolve_tui_model(
    explicit: Option<ModelChoice>,
    remembered: Option<ModelChoice>,
    configured: ModelChoice,
) -> ModelChoice {
    explicit.or(remembered).unwrap_or(configured)
}

#[cfg(not(test))]
/// Builds a session controller talking HTTP to the configured backend.
fn build_session(config: &Config, model: ModelChoice) -> anyhow::Result<SessionController> {
    let gateway = HttpGateway::new(&config.server.base_url, config.server.timeout())
        .with_context(|| format!("invalid server URL '{}'", config.server.base_url))?;
    let mut session = SessionController::new(Arc::new(gateway));
    session.set_model(model);
    Ok(session)
}

#[cfg(not(test))]
/// Starts the full-screen TUI.
async fn cmd_tui(config: Config, explicit_model: Option<ModelChoice>) -> anyhow::Result<()> {
    let tui_state = TuiState::load();
    let model = resolve_tui_model(explicit_model, tui_state.last_model, config.chat.model);
    let session = build_session(&config, model)?;

    tui::run_tui(session).await?;

    print_goodbye_banner(&config.server.base_url, model);
    Ok(())
}

#[cfg(not(test))]
/// Sends a single message in a new chat and prints the reply.
async fn cmd_ask(config: Config, exec: String) -> anyhow::Result<()> {
    let mut session = build_session(&config, config.chat.model)?;

    println!("{}", format_ask_header(&exec, config.chat.model));

    match ask(&mut session, &exec).await {
        Ok(text) => {
            println!("{text}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(not(test))]
/// Saves provider keys and reports the backend's answer.
async fn cmd_keys(config: Config, openai: String, google: String) -> anyhow::Result<()> {
    if openai.trim().is_empty() && google.trim().is_empty() {
        anyhow::bail!("nothing to save: pass --openai and/or --google");
    }
    let mut session = build_session(&config, config.chat.model)?;
    match save_keys(&mut session, &openai, &google).await {
        Ok(message) => println!("{message}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Starts a fresh chat, sends `message`, and returns the rendered reply.
async fn ask(session: &mut SessionController, message: &str) -> Result<String, String> {
    session.start_new_chat().await;
    if let Some(node) = session.transcript().last()
        && node.is_error
    {
        return Err(node.text());
    }

    session.send_message(message).await;
    match session.transcript().last() {
        Some(node) if node.role == Role::Assistant && !node.is_error => Ok(node.plain_text()),
        Some(node) if node.is_error => Err(node.text()),
        _ => Err("no reply received".to_string()),
    }
}

async fn save_keys(
    session: &mut SessionController,
    openai: &str,
    google: &str,
) -> Result<String, String> {
    session.save_api_keys(openai, google).await;
    match session.state().key_status() {
        Some(KeyStatus::Saved(message)) => Ok(message.clone()),
        Some(status) => Err(status.to_string()),
        None => Err("no response from server".to_string()),
    }
}

/// Formats ask mode header text.
fn format_ask_header(exec: &str, model: ModelChoice) -> String {
    format!("Asking {}: {exec}", model.label())
}

fn print_goodbye_banner(server: &str, model: ModelChoice) {
    println!();
    println!("  \x1b[1;32mmultichat\x1b[0m  session closed");
    println!();
    println!("  \x1b[1;37mServer\x1b[0m    \x1b[32m{server}\x1b[0m");
    println!("  \x1b[1;37mModel\x1b[0m     \x1b[32m{}\x1b[0m", model.label());
    println!();
    println!(
        "  \x1b[1;37mContinue\x1b[0m  \x1b[1;32mmultichat --model {}\x1b[0m",
        model.as_str()
    );
    println!();
}
