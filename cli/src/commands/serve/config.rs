//! # StackAI HTTP Server Configuration
//!
//! File: cli/src/commands/serve/config.rs
//!
//! ## Overview
//!
//! Combines the `[server]` section of the configuration file with command-line
//! flags. Flags win when given; otherwise the file (or its defaults) applies.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! enable_cors = true
//! ```
//!
use crate::core::config::ServerSection;
use clap::Parser;
use std::net::IpAddr;

/// # Serve Command Arguments (`ServeArgs`)
///
/// Defines the command-line arguments accepted by `stackai serve`.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on. Defaults to `[server].port` (3000).
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Address to bind. Defaults to `[server].host` (127.0.0.1).
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Disables Cross-Origin Resource Sharing (CORS) headers.
    #[arg(long)]
    pub no_cors: bool,
}

/// # Effective Server Configuration (`ServerConfig`)
///
/// Final settings the server logic uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
}

/// Applies command-line overrides to the file settings.
pub fn merge_args(args: &ServeArgs, file: &ServerSection) -> ServerConfig {
    ServerConfig {
        host: args.host.unwrap_or(file.host),
        port: args.port.unwrap_or(file.port),
        enable_cors: file.enable_cors && !args.no_cors,
    }
}
