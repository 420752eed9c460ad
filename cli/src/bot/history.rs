//! # Conversation History
//!
//! File: cli/src/bot/history.rs
//!
//! Turns are kept in the order they happened and never removed. Each one renders
//! as `Human: <text>` or `AI: <text>`, which is also the transcript format fed to
//! text-continuation backends.
//!
use std::fmt;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Human,
    Ai,
}

impl Speaker {
    /// Transcript prefix, without the trailing colon.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Human => "Human",
            Speaker::Ai => "AI",
        }
    }
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Ai,
            text: text.into(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}

/// Renders the history as a transcript ending with an open `AI:` line for the model to continue.
pub fn render_prompt(history: &[Turn]) -> String {
    let mut prompt = history
        .iter()
        .map(Turn::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str("\nAI:");
    prompt
}
