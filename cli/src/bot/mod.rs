//! # StackAI Conversation Logic (`bot`)
//!
//! File: cli/src/bot/mod.rs
//!
//! ## Overview
//!
//! Everything that decides what StackAI says, independent of how the request
//! arrived (stdin, REPL, or HTTP):
//!
//! - **`fallback`**: deterministic keyword responder used when no model is available.
//! - **`history`**: conversation turns and transcript rendering.
//! - **`chatbot`**: model-backed chatbot with per-session history.
//! - **`generator`**: the `Generator` trait and the HTTP model backends.
//!
//! ## Usage
//!
//! ```rust
//! use crate::bot::{chatbot::Chatbot, fallback, generator};
//!
//! let reply = match generator::load_generator(&cfg.model) {
//!     Ok(g) => Chatbot::new(g).get_response(prompt).await?,
//!     Err(_) => fallback::fallback_response(prompt).to_string(),
//! };
//! ```
//!

/// Model-backed chatbot holding the conversation history.
pub mod chatbot;
/// Keyword-matching responder used when the model is unavailable or fails.
pub mod fallback;
/// Pluggable model backends.
pub mod generator;
/// Conversation turns and prompt rendering.
pub mod history;
