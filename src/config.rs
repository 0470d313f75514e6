//! Configuration management for gemfinder.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Values are read lazily through accessor functions,
//! so the environment is the single source of truth:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the working directory
//! 3. `.env` in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_APP_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_SCOPE: &str = "user-read-private user-read-email user-top-read user-read-recently-played user-library-read user-library-modify playlist-read-private playlist-modify-public playlist-modify-private";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

/// Loads environment variables from `.env` files.
///
/// The working directory is searched first, then the platform-specific local
/// data directory under `gemfinder/.env`:
/// - Linux: `~/.local/share/gemfinder/.env`
/// - macOS: `~/Library/Application Support/gemfinder/.env`
/// - Windows: `%LOCALAPPDATA%/gemfinder/.env`
///
/// Missing files are not an error; variables already present in the
/// environment are never overridden.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    dotenv::dotenv().ok();

    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Local data directory of the application.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("gemfinder");
    path
}

fn required(name: &str) -> Result<String, String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{} must be set", name)),
    }
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn secs_or_default(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Address the HTTP server binds to (`SERVER_ADDRESS`).
///
/// # Example
///
/// ```
/// let addr = server_addr(); // e.g., "127.0.0.1:3000"
/// ```
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Public base URL of the app (`APP_URL`), without a trailing slash.
///
/// Used as the post-login and post-logout redirect target. A bare host is
/// promoted to `https://`.
pub fn app_url() -> String {
    let raw = or_default("APP_URL", DEFAULT_APP_URL);
    let trimmed = raw.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Spotify application client id (`SPOTIFY_API_AUTH_CLIENT_ID`).
///
/// # Errors
///
/// Fails when the variable is unset or blank.
pub fn spotify_client_id() -> Result<String, String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// OAuth redirect URI registered with Spotify (`SPOTIFY_API_REDIRECT_URI`).
///
/// Must point at this server's `/api/auth/callback` route.
pub fn spotify_redirect_uri() -> Result<String, String> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Space separated OAuth scopes (`SPOTIFY_API_AUTH_SCOPE`).
pub fn spotify_scope() -> String {
    or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

/// Spotify authorization endpoint (`SPOTIFY_API_AUTH_URL`).
pub fn spotify_apiauth_url() -> String {
    or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

/// Spotify Web API base URL (`SPOTIFY_API_URL`).
pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
}

/// Spotify token endpoint (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> String {
    or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Upper bound for a single outbound call (`SPOTIFY_REQUEST_TIMEOUT_SECS`).
pub fn request_timeout() -> Duration {
    Duration::from_secs(secs_or_default(
        "SPOTIFY_REQUEST_TIMEOUT_SECS",
        DEFAULT_REQUEST_TIMEOUT_SECS,
    ))
}

/// Lifetime of the session cookie in seconds (`SESSION_MAX_AGE_SECS`).
pub fn session_max_age() -> u64 {
    secs_or_default("SESSION_MAX_AGE_SECS", DEFAULT_SESSION_MAX_AGE_SECS)
}
