//! # CLI Module
//!
//! Command implementations behind the `gemfinder` binary.
//!
//! - [`serve`] - Runs the HTTP server (optionally opening the login page)
//! - [`discover`] - Runs the deep graph engine once for a raw access token
//!   and prints the tracks as a table
//!
//! ## Usage
//!
//! ```bash
//! gemfinder serve --open
//! SPOTIFY_ACCESS_TOKEN=... gemfinder discover
//! gemfinder completions zsh
//! ```
//!
//! Fatal problems (missing configuration, a failed bind) are reported with
//! the `error!` macro, which exits the process.

mod discover;
mod serve;

pub use discover::discover;
pub use serve::serve;
