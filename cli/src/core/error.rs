//! # StackAI Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the StackAI relay.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `StackAiError`: A custom error enum using `thiserror` for specific failure kinds
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover:
//! - Configuration errors
//! - Malformed request payloads on stdin
//! - Model backend load failures
//! - Model HTTP failures (transport, non-success status, unusable body)
//!
//! None of these ever terminate the relay: they are rendered into the reply
//! envelope (see `commands::relay::envelope`) using anyhow's `{:?}` form, which
//! includes the full `Caused by:` chain.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if config.model.model.is_empty() {
//!     anyhow::bail!(StackAiError::Config("model name must not be empty".into()));
//! }
//!
//! // Inspect the kind of a failure
//! if let Some(StackAiError::ModelRequest { status, .. }) = err.downcast_ref() {
//!     warn!("Model endpoint answered {}", status);
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the StackAI application.
#[derive(Error, Debug)]
pub enum StackAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request payload: {0}")]
    InvalidRequest(String),

    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Model request failed with status {status}: {body}")]
    ModelRequest { status: u16, body: String },

    #[error("Unusable model response: {0}")]
    ModelResponse(String),

    #[error("Model HTTP transport failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
