//! # StackAI HTTP Server Implementation
//!
//! File: cli/src/commands/serve/server_logic.rs
//!
//! ## Overview
//!
//! Exposes the relay over HTTP for web front ends:
//! - `POST /api/stackai` with `{"prompt": "..."}` returns the relay envelope
//! - an absent or empty prompt is rejected with `400 {"error": "prompt required"}`
//! - a body that is not a JSON object gets `400` with the relay's `runner_error` envelope
//! - port availability checking with automatic fallback
//! - optional permissive CORS
//! - graceful shutdown on Ctrl+C / SIGTERM
//!
//! The model backend is built once at startup and shared; each request gets its
//! own `Chatbot`, so no history leaks between callers.
//!
use super::config::ServerConfig;
use crate::commands::relay::{respond, Backend, ChatRequest, Envelope};
use crate::core::error::Result;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

/// Shared state handed to every request.
#[derive(Clone)]
struct AppState {
    backend: Backend,
}

/// # Run HTTP Server (`run_server`)
///
/// Finds a free port, builds the router and serves until a shutdown signal arrives.
///
/// ## Errors
///
/// Fails if no port is available within 10 attempts, if binding fails, or if the
/// server stops with an error.
pub async fn run_server(config: ServerConfig, backend: Backend) -> Result<()> {
    let max_port_attempts = 10;
    let addr = find_available_port(config.host, config.port, max_port_attempts).await?;

    let model_status = match &backend {
        Backend::Ready(generator) => format!("model backend '{}'", generator.name()),
        Backend::Unavailable(_) => "fallback replies only (model backend unavailable)".to_string(),
    };
    let app = create_app(&config, backend);

    println!("\n=================================================================");
    println!("🤖 StackAI relay:      POST http://{}/api/stackai", addr);
    println!("🧠 Answering with:     {}", model_status);
    println!("🔒 CORS enabled:       {}", config.enable_cors);
    println!("=================================================================\n");

    info!("Starting server on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener to address {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Find Available Port (`find_available_port`)
///
/// Tries `start_port` and then the following ports, up to `max_attempts` in total.
async fn find_available_port(
    req_host: std::net::IpAddr,
    start_port: u16,
    max_attempts: u8,
) -> Result<SocketAddr> {
    let mut current_port = start_port;

    for attempt in 0..max_attempts {
        let addr = SocketAddr::new(req_host, current_port);

        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, successfully bound to available port {}.",
                        start_port, current_port
                    );
                }
                return Ok(addr);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: Port {} on host {} is unavailable (Error: {}). Trying next port...",
                    attempt + 1,
                    current_port,
                    req_host,
                    e
                );
                current_port = match current_port.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    anyhow::bail!(
        "Could not find an available port on host {} starting from port {} after trying {} ports.",
        req_host,
        start_port,
        max_attempts
    )
}

/// # Create Axum Application (`create_app`)
///
/// Builds the router with the relay route, request tracing and CORS.
fn create_app(config: &ServerConfig, backend: Backend) -> Router {
    let cors_layer = if config.enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(false))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/api/stackai", post(handle_stackai))
        .with_state(AppState { backend })
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(cors_layer),
        )
}

/// `POST /api/stackai`
///
/// The body is read as raw bytes and parsed like relay stdin, whatever the
/// content type, so every rejection still answers in JSON.
async fn handle_stackai(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match std::str::from_utf8(&body)
        .context("Request body is not valid UTF-8")
        .and_then(ChatRequest::parse)
        .context("Failed to parse request JSON")
    {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected request: {:#}", e);
            return (StatusCode::BAD_REQUEST, Json(Envelope::runner_error(&e))).into_response();
        }
    };

    let prompt = request.prompt();
    if prompt.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "prompt required" })),
        )
            .into_response();
    }
    Json(respond(prompt, &state.backend).await).into_response()
}
