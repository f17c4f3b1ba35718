//! spcanvas library
//!
//! Authenticates against the Spotify web player with an anonymous session
//! cookie and a TOTP code, keeps the resulting bearer token fresh, and uses it
//! to fetch track canvases (the looping videos behind tracks) and catalog data.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error type shared by the Spotify calls
//! - `management` - Secret rotation and token lifecycle
//! - `proto` - Canvas protobuf wire codec
//! - `server` - Local HTTP server
//! - `spotify` - Spotify web player and Web API client
//! - `totp` - TOTP code generation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use spcanvas::{config::ServiceOptions, management::AuthManager, spotify::SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> spcanvas::Res<()> {
//!     let auth = Arc::new(AuthManager::new(ServiceOptions::from_env())?);
//!     auth.start().await;
//!     let client = SpotifyClient::new(auth);
//!     let canvas = client.get_canvas_by_track_id("4uLU6hMCjMI75M1A2tKUQC").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod proto;
pub mod server;
pub mod spotify;
pub mod totp;
pub mod types;
pub mod utils;

/// Boxed-error result used by the CLI and server entry points.
///
/// Library components return [`error::SpotifyError`] or degrade to
/// `Option`/`bool`; this alias is for the outer layers that only report.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line prefixed with a blue `o`.
///
/// ```
/// info!("Serving API on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a status line prefixed with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line and exits with status 1.
///
/// Evaluates to `!`, so it can stand in for a value in a match arm or end a
/// `let ... else` block.
///
/// ```
/// let addr = match parse(&raw) {
///     Ok(addr) => addr,
///     Err(e) => error!("Bad address {}: {}", raw, e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a status line prefixed with a yellow `!`. Does not exit.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
