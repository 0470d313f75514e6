//! # API Module
//!
//! HTTP endpoints of the Gemfinder server. Every handler is an axum async
//! function over the shared [`AppState`](crate::server::AppState); the routing
//! table lives in [`crate::server::router`].
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Starts the Spotify OAuth 2.0 PKCE flow
//! - [`callback`] - Exchanges the authorization code and opens a server-side session
//! - [`logout`] - Drops the session and expires every token cookie
//!
//! ### Discovery
//!
//! - [`recommendations`] - Deep graph "hidden gems" for the listener
//! - [`seed_recommendations`] - Spotify recommendations seeded by one track
//! - [`search`] - Best matching track plus related tracks
//!
//! ### Listener data
//!
//! - [`profile`], [`library`], [`save_track`], [`remove_track`]
//! - [`playlists`], [`playlist_tracks`], [`create_playlist`], [`add_to_playlist`]
//!
//! ### Monitoring
//!
//! - [`health`] - Status and version
//!
//! ## Authentication
//!
//! Protected handlers take a [`BearerToken`] argument. The extractor runs
//! before any body or query parsing, so an anonymous request is always
//! answered with 401. Failures are reported through [`ApiError`] as
//! `{"error": "<message>"}`.

mod auth;
mod error;
mod health;
mod library;
mod playlists;
mod profile;
mod recommendations;
mod search;
mod token;

pub use auth::{callback, login, logout};
pub use error::ApiError;
pub use health::health;
pub use library::{library, remove_track, save_track};
pub use playlists::{add_to_playlist, create_playlist, playlist_tracks, playlists};
pub use profile::{profile, top_artists};
pub use recommendations::{recommendations, seed_recommendations};
pub use search::search;
pub use token::BearerToken;
