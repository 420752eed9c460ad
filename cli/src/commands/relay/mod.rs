//! # StackAI Stdin Relay
//!
//! File: cli/src/commands/relay/mod.rs
//!
//! ## Overview
//!
//! The default mode of the binary: read one JSON request from stdin, answer it,
//! write one JSON envelope to stdout, exit 0. Whatever goes wrong, stdout still
//! receives exactly one well-formed JSON object.
//!
//! ## Architecture
//!
//! Failures degrade in two tiers, then a catch-all:
//! 1. The model backend cannot be built (bad config, provider `none`, no key):
//!    the fallback reply is sent with `import_error`.
//! 2. The model call fails: the fallback reply is sent with `warning`.
//! 3. Anything else (unreadable stdin, malformed JSON): `runner_error`.
//!
//! `Backend` and `respond` are shared with `stackai serve` and `stackai chat`.
//!
//! ## Examples
//!
//! ```bash
//! echo '{"prompt": "hello"}' | stackai
//! # {"reply":"Hi! I'm StackAI (fallback). Ask me about stocks or trading.","import_error":"..."}
//! ```
//!
use crate::bot::{chatbot::Chatbot, fallback::fallback_response, generator};
use crate::core::config;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod envelope;

pub use envelope::{trace_text, ChatRequest, Envelope};

/// Arguments for `stackai relay`. The relay takes everything from stdin.
#[derive(Parser, Debug, Default)]
pub struct RelayArgs {}

/// Outcome of trying to build the model backend.
#[derive(Clone)]
pub enum Backend {
    Ready(Arc<dyn generator::Generator>),
    /// Load failed; holds the diagnostic text attached to fallback replies.
    Unavailable(String),
}

impl Backend {
    /// Loads configuration and builds the generator, keeping any failure as text.
    pub fn load(config_path: Option<&Path>) -> Self {
        let loaded = config::load_config(config_path)
            .and_then(|cfg| generator::load_generator(&cfg.model));
        Self::from_result(loaded)
    }

    pub fn from_result(result: Result<Arc<dyn generator::Generator>>) -> Self {
        match result {
            Ok(generator) => Backend::Ready(generator),
            Err(e) => {
                warn!("Model backend unavailable, using fallback replies: {}", e);
                Backend::Unavailable(trace_text(&e))
            }
        }
    }
}

/// Answers one prompt with a fresh chatbot, degrading to the fallback responder.
pub async fn respond(prompt: &str, backend: &Backend) -> Envelope {
    match backend {
        Backend::Ready(generator) => {
            let mut bot = Chatbot::new(Arc::clone(generator));
            match bot.get_response(prompt).await {
                Ok(reply) => Envelope::Reply { reply },
                Err(e) => {
                    warn!("Model call failed, using fallback reply: {:#}", e);
                    Envelope::Degraded {
                        reply: fallback_response(prompt).to_string(),
                        warning: trace_text(&e),
                    }
                }
            }
        }
        Backend::Unavailable(detail) => Envelope::ImportFallback {
            reply: fallback_response(prompt).to_string(),
            import_error: detail.clone(),
        },
    }
}

/// Handles one raw request body. Never fails: errors become `runner_error`.
pub async fn relay_once(raw: &str, config_path: Option<&Path>) -> Envelope {
    match ChatRequest::parse(raw).context("Failed to parse request JSON") {
        Ok(request) => {
            debug!("Relaying prompt of {} bytes", request.prompt().len());
            let backend = Backend::load(config_path);
            respond(request.prompt(), &backend).await
        }
        Err(e) => {
            error!("Relay failed: {:#}", e);
            Envelope::runner_error(&e)
        }
    }
}

/// # Handle Relay Command (`handle_relay`)
///
/// Reads stdin to the end, relays it, and writes the envelope to stdout.
///
/// ## Returns
///
/// * `Result<()>`: Only fails if stdout itself cannot be written.
pub async fn handle_relay(_args: RelayArgs, config_path: Option<&Path>) -> Result<()> {
    info!("Handling relay request from stdin");

    let envelope = match read_stdin() {
        Ok(raw) => relay_once(&raw, config_path).await,
        Err(e) => {
            error!("Relay failed: {:#}", e);
            Envelope::runner_error(&e)
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    envelope.write_to(&mut out)
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read request from stdin")?;
    Ok(raw)
}
