//! # Model Generators
//!
//! File: cli/src/bot/generator/mod.rs
//!
//! ## Overview
//!
//! A `Generator` turns the conversation so far into the model's continuation.
//! The chatbot only sees this trait; which backend sits behind it is decided
//! once, from `[model]` configuration, by `load_generator`.
//!
//! ## Architecture
//!
//! - `Generator`: object-safe async trait (`async-trait`), shared as `Arc<dyn Generator>`
//! - `SamplingParams`: decoding knobs passed to every request
//! - `openai`: HTTP backends speaking the OpenAI-compatible `completions` and
//!   `chat/completions` APIs
//!
//! Failing to build a generator is the "model dependency failed to load" case
//! of the relay: callers keep the error and answer from the fallback responder.
//!
//! ## Examples
//!
//! ```rust
//! let generator = generator::load_generator(&cfg.model)?;
//! let continuation = generator.generate(&[Turn::human("hello")]).await?;
//! ```
//!
use crate::bot::history::Turn;
use crate::core::config::{ModelConfig, Provider};
use crate::core::error::{Result, StackAiError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod openai;

/// Source of model continuations.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Returns the raw text the model produced after the open `AI:` line.
    ///
    /// The result is not trimmed or truncated; that is the chatbot's job.
    async fn generate(&self, history: &[Turn]) -> Result<String>;
}

/// Decoding parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl SamplingParams {
    /// Greedy decoding (`do_sample = false`) is expressed as temperature 0.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: if config.do_sample {
                config.temperature
            } else {
                0.0
            },
            top_p: config.top_p,
        }
    }
}

/// Builds the generator described by `config`.
///
/// # Errors
///
/// Returns `StackAiError::BackendUnavailable` when the provider is `none`, or when it is
/// `auto` and no API key can be found. HTTP client construction failures are propagated.
pub fn load_generator(config: &ModelConfig) -> Result<Arc<dyn Generator>> {
    let api_key = config.resolve_api_key();
    let provider = match config.provider {
        Provider::None => {
            anyhow::bail!(StackAiError::BackendUnavailable(
                "model provider is set to 'none'".to_string()
            ))
        }
        Provider::Auto if api_key.is_none() => {
            anyhow::bail!(StackAiError::BackendUnavailable(format!(
                "no model provider configured and ${} is not set",
                config.api_key_env
            )))
        }
        Provider::Auto => Provider::Chat,
        explicit => explicit,
    };

    let client = openai::OpenAiClient::new(config, api_key)?;
    let generator: Arc<dyn Generator> = if provider == Provider::Completions {
        Arc::new(openai::CompletionsGenerator::new(client))
    } else {
        Arc::new(openai::ChatGenerator::new(
            client,
            config.system_prompt.clone(),
        ))
    };
    info!(
        "Model backend '{}' ready ({} at {})",
        generator.name(),
        config.model,
        config.base_url
    );
    Ok(generator)
}
