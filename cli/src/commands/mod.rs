//! # StackAI Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the entry points of the StackAI CLI. Each command
//! defines its own arguments structure and handler function; `main.rs` routes to
//! them.
//!
//! ## Command Groups
//!
//! - `relay`: one JSON request on stdin, one JSON envelope on stdout (default)
//! - `chat`: interactive terminal session with conversation history
//! - `serve`: the relay as an HTTP endpoint (`POST /api/stackai`)
//!

/// Interactive REPL over the chatbot.
pub mod chat;
/// Stdin/stdout JSON relay, plus the backend and reply logic shared by the other commands.
pub mod relay;
/// HTTP server exposing the relay.
pub mod serve;
