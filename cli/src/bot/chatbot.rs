//! # Model-Backed Chatbot
//!
//! File: cli/src/bot/chatbot.rs
//!
//! ## Overview
//!
//! `Chatbot` owns the conversation history for one session and asks a
//! `Generator` for each reply. Replies are cut down to a single line: the model
//! often keeps going and invents the next `Human:` turn, so only the text before
//! the first newline is kept.
//!
//! ## Examples
//!
//! ```rust
//! let mut bot = Chatbot::new(generator);
//! let reply = bot.get_response("hello").await?;
//! assert_eq!(bot.history().len(), 2);
//! ```
//!
use crate::bot::fallback::EMPTY_PROMPT_REPLY;
use crate::bot::generator::Generator;
use crate::bot::history::Turn;
use crate::core::error::Result;
use std::sync::Arc;
use tracing::debug;

/// A conversation with a model, one instance per session.
pub struct Chatbot {
    generator: Arc<dyn Generator>,
    history: Vec<Turn>,
}

impl Chatbot {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            history: Vec::new(),
        }
    }

    /// Every turn so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Produces the model's reply to `text` and records both turns.
    ///
    /// Blank input is answered with `Please say something.` without calling the model
    /// or touching history.
    ///
    /// # Errors
    ///
    /// Propagates generator failures. The human turn is recorded before the call and
    /// stays in history if it fails.
    pub async fn get_response(&mut self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(EMPTY_PROMPT_REPLY.to_string());
        }

        self.history.push(Turn::human(text));
        let continuation = self.generator.generate(&self.history).await?;
        debug!(
            "Backend '{}' returned {} bytes",
            self.generator.name(),
            continuation.len()
        );

        let reply = first_line(&continuation).to_string();
        self.history.push(Turn::ai(reply.clone()));
        Ok(reply)
    }
}

/// Trims the continuation and keeps only what precedes its first newline.
fn first_line(continuation: &str) -> &str {
    let trimmed = continuation.trim();
    match trimmed.split_once('\n') {
        Some((head, _)) => head,
        None => trimmed,
    }
}
