//! # StackAI Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the StackAI CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! Without a subcommand the binary acts as the stdin relay, so it can be spawned
//! by another process with nothing but a JSON payload on stdin. Logs always go to
//! stderr; stdout belongs to the command's output.
//!
//! ## Examples
//!
//! ```bash
//! # One-shot relay (same as `stackai relay`)
//! echo '{"prompt": "Should I invest in AAPL?"}' | stackai
//!
//! # Interactive session with debug logs
//! stackai -vv chat
//!
//! # HTTP endpoint using an explicit config file
//! stackai --config ~/stackai.toml serve --port 8080
//! ```
//!
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod bot; // Conversation logic (fallback, chatbot, model backends)
mod commands; // Handles specific command logic (relay, chat, serve)
mod core; // Core infrastructure (errors, config)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "stackai",
    about = "StackAI: chat relay with a model backend and a deterministic fallback",
    long_about = "Reads {\"prompt\": ...} on stdin and writes a JSON reply on stdout.\n\
                  Uses an OpenAI-compatible model endpoint when configured, and canned\n\
                  keyword replies when the model is unavailable or fails.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Read configuration from this file only, skipping the user and project files.
    #[arg(long, global = true, env = "STACKAI_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Answer one JSON request from stdin (the default).
    #[command(alias = "r")]
    Relay(commands::relay::RelayArgs),
    /// Chat interactively in the terminal.
    #[command(alias = "c")]
    Chat(commands::chat::ChatArgs),
    /// Serve the relay over HTTP.
    #[command(alias = "s")]
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let config_path = cli.config.as_deref();
    let command_result = match cli.command {
        None => commands::relay::handle_relay(Default::default(), config_path).await,
        Some(Commands::Relay(args)) => commands::relay::handle_relay(args, config_path).await,
        Some(Commands::Chat(args)) => commands::chat::handle_chat(args, config_path).await,
        Some(Commands::Serve(args)) => commands::serve::handle_serve(args, config_path).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
