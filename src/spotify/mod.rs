//! # Spotify Integration Module
//!
//! This module is the only place that talks to the Spotify Web API. It is split
//! by domain, each file adding an `impl SpotifyClient` block:
//!
//! ```text
//! Handlers / Discovery engine
//!          ↓
//!   MusicProvider (trait seam, mocked in tests)
//!          ↓
//!   SpotifyClient
//!     ├── artists   (related artists, artist top tracks)
//!     ├── tracks    (top tracks, new releases, search, recommendations)
//!     ├── library   (profile, liked songs)
//!     └── playlists (list, items, create, add)
//!          ↓
//!   reqwest → Spotify Web API
//! ```
//!
//! [`auth`] is separate: it talks to the accounts service for the OAuth 2.0
//! PKCE flow and token refresh.
//!
//! ## Error Handling
//!
//! Every call returns [`SpotifyError`]. Non-2xx responses keep their status and
//! body so the API layer can pass the status through. Calls are never retried;
//! a `429 Too Many Requests` is logged together with its `Retry-After` value.
//! Each request carries the client-level timeout from
//! [`crate::config::request_timeout`].

pub mod artists;
pub mod auth;
pub mod library;
pub mod playlists;
pub mod tracks;

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config,
    types::{
        Album, Artist, CreatePlaylistRequest, CreatePlaylistResponse, Playlist, PlaylistItem,
        SavedTrack, Track, UserProfile,
    },
    warning,
};

pub use auth::SpotifyAuth;

#[derive(Debug)]
pub enum SpotifyError {
    Http(reqwest::Error),
    Status { status: u16, body: String },
    InvalidResponse(String),
    Timeout,
}

impl fmt::Display for SpotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpotifyError::Http(e) => write!(f, "request to Spotify failed: {}", e),
            SpotifyError::Status { status, body } => {
                write!(f, "Spotify responded with {}: {}", status, body)
            }
            SpotifyError::InvalidResponse(reason) => {
                write!(f, "unexpected response from Spotify: {}", reason)
            }
            SpotifyError::Timeout => write!(f, "request to Spotify timed out"),
        }
    }
}

impl std::error::Error for SpotifyError {}

impl From<reqwest::Error> for SpotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpotifyError::Timeout
        } else {
            SpotifyError::Http(err)
        }
    }
}

/// The read and write operations the app needs from the music provider.
///
/// Every operation takes the listener's bearer token; implementations hold no
/// per-listener state.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// The listener's top tracks over the short-term window.
    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>, SpotifyError>;

    async fn related_artists(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Artist>, SpotifyError>;

    async fn artist_top_tracks(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Track>, SpotifyError>;

    async fn new_releases(&self, token: &str, limit: u32) -> Result<Vec<Album>, SpotifyError>;

    async fn search_tracks(
        &self,
        token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError>;

    async fn recommendations(
        &self,
        token: &str,
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError>;

    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError>;

    async fn saved_tracks(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SavedTrack>, SpotifyError>;

    async fn save_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError>;

    async fn remove_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError>;

    async fn playlists(&self, token: &str, limit: u32) -> Result<Vec<Playlist>, SpotifyError>;

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, SpotifyError>;

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, SpotifyError>;

    async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError>;
}

/// reqwest-backed [`MusicProvider`].
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, SpotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self, SpotifyError> {
        Self::new(config::spotify_apiurl(), config::request_timeout())
    }

    fn request(&self, method: Method, token: &str, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SpotifyError> {
        let response = self
            .request(Method::GET, token, path)
            .query(query)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<Response, SpotifyError> {
        let response = self
            .request(method, token, path)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        warning!(
            "Spotify rate limit reached, retry after {} seconds",
            retry_after
        );
    }

    let body = response.text().await.unwrap_or_default();
    Err(SpotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MusicProvider for SpotifyClient {
    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>, SpotifyError> {
        self.get_top_tracks(token, limit).await
    }

    async fn related_artists(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Artist>, SpotifyError> {
        self.get_related_artists(token, artist_id).await
    }

    async fn artist_top_tracks(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.get_artist_top_tracks(token, artist_id).await
    }

    async fn new_releases(&self, token: &str, limit: u32) -> Result<Vec<Album>, SpotifyError> {
        self.get_new_releases(token, limit).await
    }

    async fn search_tracks(
        &self,
        token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.search(token, query, limit).await
    }

    async fn recommendations(
        &self,
        token: &str,
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.get_recommendations(token, seed_tracks, limit).await
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        self.get_current_user(token).await
    }

    async fn saved_tracks(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SavedTrack>, SpotifyError> {
        self.get_saved_tracks(token, limit, offset).await
    }

    async fn save_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError> {
        self.put_saved_track(token, track_id).await
    }

    async fn remove_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError> {
        self.delete_saved_track(token, track_id).await
    }

    async fn playlists(&self, token: &str, limit: u32) -> Result<Vec<Playlist>, SpotifyError> {
        self.get_playlists(token, limit).await
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, SpotifyError> {
        self.get_playlist_tracks(token, playlist_id).await
    }

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, SpotifyError> {
        self.post_playlist(token, user_id, request).await
    }

    async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError> {
        self.post_playlist_tracks(token, playlist_id, uris).await
    }
}
