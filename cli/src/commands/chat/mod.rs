//! # StackAI Interactive Chat
//!
//! File: cli/src/commands/chat/mod.rs
//!
//! ## Overview
//!
//! A terminal REPL over the same chatbot the relay uses. Unlike the relay, one
//! `Chatbot` lives for the whole session, so the model sees the conversation so
//! far on every turn.
//!
//! - `quit` or `exit` (any case) ends the session; so does end of input.
//! - Without a model backend every reply comes from the fallback responder.
//! - A failed model call falls back for that turn only.
//!
//! ## Examples
//!
//! ```bash
//! stackai chat
//! # StackAI is ready! Type 'quit' to exit.
//! # You: hello
//! # AI: Hi! I'm StackAI (fallback). Ask me about stocks or trading.
//! ```
//!
use crate::bot::{chatbot::Chatbot, fallback::fallback_response};
use crate::commands::relay::Backend;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

const BANNER: &str = "StackAI is ready! Type 'quit' to exit.";
const FAREWELL: &str = "Goodbye!";

/// Arguments for `stackai chat`.
#[derive(Parser, Debug, Default)]
pub struct ChatArgs {}

/// # Handle Chat Command (`handle_chat`)
///
/// Loads the backend once and runs the REPL on the terminal.
pub async fn handle_chat(_args: ChatArgs, config_path: Option<&Path>) -> Result<()> {
    info!("Handling chat command");
    let backend = Backend::load(config_path);
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl(backend, stdin.lock(), stdout.lock()).await
}

/// Drives one session: prompt, read a line, answer, until `quit`/`exit` or end of input.
pub async fn run_repl<R: BufRead, W: Write>(backend: Backend, input: R, mut out: W) -> Result<()> {
    let mut bot = match backend {
        Backend::Ready(generator) => Some(Chatbot::new(generator)),
        Backend::Unavailable(_) => {
            warn!("No model backend; all replies in this session come from the fallback responder.");
            None
        }
    };

    writeln!(out, "{}\n", BANNER).context("Failed to write to terminal")?;
    let mut lines = input.lines();
    loop {
        write!(out, "You: ").context("Failed to write to terminal")?;
        out.flush().context("Failed to flush terminal")?;

        let line = match lines.next() {
            Some(line) => line.context("Failed to read from terminal")?,
            None => {
                writeln!(out).context("Failed to write to terminal")?;
                break;
            }
        };

        let command = line.trim();
        if command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit") {
            writeln!(out, "{}", FAREWELL).context("Failed to write to terminal")?;
            break;
        }

        let reply = match bot.as_mut() {
            Some(bot) => match bot.get_response(&line).await {
                Ok(reply) => {
                    debug!("Session history now holds {} turns", bot.history().len());
                    reply
                }
                Err(e) => {
                    warn!("Model call failed, answering from fallback: {:#}", e);
                    fallback_response(&line).to_string()
                }
            },
            None => fallback_response(&line).to_string(),
        };
        writeln!(out, "AI: {}", reply).context("Failed to write to terminal")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::fallback::{GENERIC_REPLY, GREETING_REPLY};
    use crate::bot::generator::testing::ScriptedGenerator;
    use crate::bot::history::Turn;
    use std::io::Cursor;

    async fn session(backend: Backend, input: &str) -> String {
        let mut out = Vec::new();
        run_repl(backend, Cursor::new(input.to_string()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn quit_ends_the_session() {
        let output = session(Backend::Unavailable("none".into()), "hello\nQUIT\nignored\n").await;
        assert!(output.starts_with(BANNER));
        assert!(output.contains(&format!("AI: {}", GREETING_REPLY)));
        assert!(output.ends_with("You: Goodbye!\n"));
        assert_eq!(output.matches("AI: ").count(), 1);
    }

    #[tokio::test]
    async fn end_of_input_ends_the_session() {
        let output = session(Backend::Unavailable("none".into()), "tell me a joke\n").await;
        assert!(output.contains(&format!("AI: {}", GENERIC_REPLY)));
        assert!(!output.contains(FAREWELL));
    }

    #[tokio::test]
    async fn model_session_keeps_history() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Hello!".to_string()),
            Ok("Still here.\nHuman: bye".to_string()),
        ]);
        let output = session(Backend::Ready(generator.clone()), "hi\nare you there?\nexit\n").await;

        assert!(output.contains("AI: Hello!\n"));
        assert!(output.contains("AI: Still here.\n"));
        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].len(), 3);
    }

    #[tokio::test]
    async fn history_keeps_user_spacing() {
        let generator = ScriptedGenerator::replying("Sure.");
        let output = session(Backend::Ready(generator.clone()), "  two  spaces \n exit \n").await;

        assert!(output.contains("AI: Sure.\n"));
        assert!(output.ends_with("You: Goodbye!\n"));
        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![Turn::human("  two  spaces ")]);
    }

    #[tokio::test]
    async fn failed_model_turn_falls_back() {
        let generator = ScriptedGenerator::failing("timeout");
        let output = session(Backend::Ready(generator), "hello\nexit\n").await;
        assert!(output.contains(&format!("AI: {}", GREETING_REPLY)));
    }
}
