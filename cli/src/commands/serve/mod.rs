//! # StackAI HTTP Relay
//!
//! File: cli/src/commands/serve/mod.rs
//!
//! ## Overview
//!
//! Runs the relay as a long-lived HTTP service, so a web front end can post
//! prompts without spawning one process per message.
//!
//! ## Architecture
//!
//! - `config.rs`: `ServeArgs` and merging with the `[server]` file section
//! - `server_logic.rs`: Axum router, port selection, graceful shutdown
//!
//! ## Examples
//!
//! ```bash
//! # Serve on the configured address (127.0.0.1:3000 by default)
//! stackai serve
//!
//! # Bind everywhere on another port, without CORS headers
//! stackai serve --host 0.0.0.0 --port 8080 --no-cors
//!
//! curl -s -XPOST localhost:3000/api/stackai -H 'content-type: application/json' \
//!      -d '{"prompt":"hello"}'
//! ```
//!
use crate::commands::relay::Backend;
use crate::core::config as core_config;
use crate::core::error::Result;
use std::path::Path;
use tracing::info;

pub use config::ServeArgs;

/// Merges `ServeArgs` with the `[server]` configuration section.
pub mod config;

/// Contains the Axum-based HTTP server implementation.
pub mod server_logic;

/// # Handle Serve Command (`handle_serve`)
///
/// Loads configuration, builds the model backend once, and runs the server.
///
/// A configuration that cannot be loaded is fatal here, unlike in the stdin
/// relay: the server needs it to know where to bind. A backend that cannot be
/// built is not; the server then answers with fallback replies.
pub async fn handle_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);

    let cfg = core_config::load_config(config_path)?;
    let server_config = config::merge_args(&args, &cfg.server);
    info!("Effective server config: {:?}", server_config);

    let backend = Backend::from_result(crate::bot::generator::load_generator(&cfg.model));
    server_logic::run_server(server_config, backend).await
}
