//! Gemfinder Library
//!
//! This library backs a small Spotify discovery service. It resolves the
//! listener's bearer token from a server-side session (or from legacy chunked
//! cookies), crawls the related-artist graph around the listener's recent top
//! tracks and returns moderately popular "hidden gems".
//!
//! # Modules
//!
//! - `api` - axum handlers, the bearer-token extractor and the API error type
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `discovery` - The deep graph recommendation engine
//! - `management` - Server-side session storage
//! - `server` - Application state and HTTP router
//! - `session` - Token reconstruction from request cookies
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use gemfinder::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> gemfinder::Res<()> {
//!     config::load_env().await?;
//!     let state = server::AppState::from_env()?;
//!     server::start_api_server(state, &config::server_addr()).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod management;
pub mod server;
pub mod session;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Provides a standard error handling pattern for the binary and CLI plumbing
/// using a boxed dynamic error trait object. Request paths use the typed
/// errors in [`api`], [`spotify`] and [`discovery`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for fatal startup errors in the binary. Request handlers never
/// call this; they return an [`api::ApiError`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems, e.g. an upstream call that failed but was
/// absorbed by the caller.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
