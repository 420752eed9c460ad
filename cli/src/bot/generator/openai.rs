//! # OpenAI-Compatible HTTP Backends
//!
//! File: cli/src/bot/generator/openai.rs
//!
//! ## Overview
//!
//! Two generators over the same HTTP client:
//! - `CompletionsGenerator` posts the rendered transcript (`Human: ...\nAI:`) to
//!   `{base_url}/completions` and returns `choices[0].text`. This is the
//!   text-continuation path, suited to small dialogue models served locally.
//! - `ChatGenerator` posts a system message plus the history as role-tagged
//!   messages to `{base_url}/chat/completions` and returns
//!   `choices[0].message.content` (or `choices[0].text` if the server answers
//!   in completions shape).
//!
//! Non-success statuses become `StackAiError::ModelRequest`; a body without a
//! usable choice becomes `StackAiError::ModelResponse`.
//!
use super::{Generator, SamplingParams};
use crate::bot::history::{render_prompt, Speaker, Turn};
use crate::core::config::ModelConfig;
use crate::core::error::{Result, StackAiError};
use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// System message used by the chat backend when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are StackAI, a helpful assistant. When asked finance or investment questions, give general information only and include a clear non-actionable disclaimer.";

/// Thin client for an OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    sampling: SamplingParams,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(StackAiError::from)
            .context("Failed to build HTTP client for the model backend")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            sampling: SamplingParams::from_config(config),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(StackAiError::from)
            .with_context(|| format!("Failed to reach model endpoint {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read error body from {}: {}", url, e);
                    String::new()
                }
            };
            warn!("Model endpoint {} answered {}", url, status);
            anyhow::bail!(StackAiError::ModelRequest {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(StackAiError::from)
            .with_context(|| format!("Failed to decode response from {}", url))
    }
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OutgoingMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize, Debug, PartialEq)]
struct OutgoingMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChoicesResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<IncomingMessage>,
}

#[derive(Deserialize, Debug)]
struct IncomingMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChoicesResponse {
    fn first_choice(self) -> Result<Choice> {
        self.choices.into_iter().next().ok_or_else(|| {
            anyhow::anyhow!(StackAiError::ModelResponse(
                "response contained no choices".to_string()
            ))
        })
    }
}

/// Text continuation of the rendered transcript.
pub struct CompletionsGenerator {
    client: OpenAiClient,
}

impl CompletionsGenerator {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Generator for CompletionsGenerator {
    fn name(&self) -> &'static str {
        "completions"
    }

    async fn generate(&self, history: &[Turn]) -> Result<String> {
        let prompt = render_prompt(history);
        let sampling = self.client.sampling;
        let body = CompletionRequest {
            model: &self.client.model,
            prompt: &prompt,
            max_tokens: sampling.max_new_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        };
        let response: ChoicesResponse = self.client.post("completions", &body).await?;
        let choice = response.first_choice()?;
        choice
            .text
            .or_else(|| choice.message.and_then(|m| m.content))
            .ok_or_else(|| {
                anyhow::anyhow!(StackAiError::ModelResponse(
                    "first choice carried no text".to_string()
                ))
            })
    }
}

/// Role-tagged chat completion over the history.
pub struct ChatGenerator {
    client: OpenAiClient,
    system_prompt: String,
}

impl ChatGenerator {
    pub fn new(client: OpenAiClient, system_prompt: Option<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    fn messages<'a>(&'a self, history: &'a [Turn]) -> Vec<OutgoingMessage<'a>> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(OutgoingMessage {
            role: "system",
            content: &self.system_prompt,
        });
        messages.extend(history.iter().map(|turn| OutgoingMessage {
            role: match turn.speaker {
                Speaker::Human => "user",
                Speaker::Ai => "assistant",
            },
            content: &turn.text,
        }));
        messages
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn generate(&self, history: &[Turn]) -> Result<String> {
        let sampling = self.client.sampling;
        let body = ChatRequest {
            model: &self.client.model,
            messages: self.messages(history),
            max_tokens: sampling.max_new_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        };
        let response: ChoicesResponse = self.client.post("chat/completions", &body).await?;
        let choice = response.first_choice()?;
        choice
            .message
            .and_then(|m| m.content)
            .or(choice.text)
            .ok_or_else(|| {
                anyhow::anyhow!(StackAiError::ModelResponse(
                    "first choice carried no message content".to_string()
                ))
            })
    }
}
