#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use gemfinder::{
    spotify::{MusicProvider, SpotifyError},
    types::{
        Album, AlbumRef, Artist, ArtistRef, CreatePlaylistRequest, CreatePlaylistResponse, Image,
        Playlist, PlaylistItem, SavedTrack, Track, UserProfile,
    },
};

pub fn track(id: &str, artist_id: &str, popularity: u32) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        uri: format!("spotify:track:{}", id),
        artists: vec![ArtistRef {
            id: artist_id.to_string(),
            name: format!("Artist {}", artist_id),
        }],
        album: Some(AlbumRef {
            id: format!("album-{}", id),
            name: format!("Album {}", id),
            images: vec![Image {
                url: format!("https://img.test/{}.jpg", id),
                height: Some(640),
                width: Some(640),
            }],
        }),
        popularity,
        duration_ms: Some(215_000),
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        ..Default::default()
    }
}

pub fn album(id: &str, artist_id: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Album {}", id),
        artists: vec![ArtistRef {
            id: artist_id.to_string(),
            name: format!("Artist {}", artist_id),
        }],
        images: Vec::new(),
        release_date: "2025-01-01".to_string(),
    }
}

// One catalogue track followed by a local file, as Spotify returns them.
pub const PLAYLIST_PAGE_WITH_LOCAL_FILE: &str = r#"{
    "items": [
        {
            "added_at": "2025-02-01T12:00:00Z",
            "is_local": false,
            "track": {
                "id": "4uLU6hMCjMI75M1A2tKUQC",
                "name": "Never Gonna Give You Up",
                "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
                "popularity": 77,
                "duration_ms": 213573,
                "artists": [{ "id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley" }],
                "album": {
                    "id": "6XhjNHCyCDyyGJRM5mg40G",
                    "name": "Whenever You Need Somebody",
                    "images": [{ "url": "https://i.scdn.co/image/abc", "height": 640, "width": 640 }]
                }
            }
        },
        {
            "added_at": "2025-02-02T12:00:00Z",
            "is_local": true,
            "track": {
                "id": null,
                "name": "demo-take-3",
                "uri": "spotify:local:::demo-take-3:180",
                "popularity": 0,
                "duration_ms": 180000,
                "artists": [{ "id": null, "name": "" }],
                "album": { "id": null, "name": "", "images": [] }
            }
        },
        { "added_at": null, "track": null }
    ],
    "total": 3,
    "next": null
}"#;

pub fn playlist_items_with_local_file() -> Vec<PlaylistItem> {
    serde_json::from_str::<gemfinder::types::Paging<PlaylistItem>>(PLAYLIST_PAGE_WITH_LOCAL_FILE)
        .unwrap()
        .items
}

fn upstream_error() -> SpotifyError {
    SpotifyError::Status {
        status: 500,
        body: "mock failure".to_string(),
    }
}

/// In-memory [`MusicProvider`] keyed by artist id.
///
/// Ids in `failing` answer with a 500, ids in `hanging` never answer.
/// `related_failing` only breaks the related-artists call of an artist.
#[derive(Default)]
pub struct MockProvider {
    pub top_tracks: Vec<Track>,
    pub top_tracks_fail: bool,
    pub related: HashMap<String, Vec<Artist>>,
    pub artist_tracks: HashMap<String, Vec<Track>>,
    pub new_releases: Vec<Album>,
    pub new_releases_fail: bool,
    pub search_hits: Vec<Track>,
    pub recommended: Vec<Track>,
    pub saved: Vec<SavedTrack>,
    pub playlist_items: Vec<PlaylistItem>,
    pub failing: HashSet<String>,
    pub related_failing: HashSet<String>,
    pub hanging: HashSet<String>,
    pub unauthorized: bool,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn with_top_tracks(tracks: Vec<Track>) -> Self {
        Self {
            top_tracks: tracks,
            ..Default::default()
        }
    }

    pub fn related_to(mut self, artist_id: &str, related: &[&str]) -> Self {
        self.related.insert(
            artist_id.to_string(),
            related.iter().map(|id| artist(id)).collect(),
        );
        self
    }

    pub fn tracks_of(mut self, artist_id: &str, tracks: Vec<Track>) -> Self {
        self.artist_tracks.insert(artist_id.to_string(), tracks);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn related_failing(mut self, id: &str) -> Self {
        self.related_failing.insert(id.to_string());
        self
    }

    pub fn hanging(mut self, id: &str) -> Self {
        self.hanging.insert(id.to_string());
        self
    }

    pub fn tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }

    async fn enter(&self, token: &str, id: &str) -> Result<(), SpotifyError> {
        self.seen_tokens.lock().unwrap().push(token.to_string());
        if self.unauthorized {
            return Err(SpotifyError::Status {
                status: 401,
                body: "The access token expired".to_string(),
            });
        }
        if self.hanging.contains(id) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(id) {
            return Err(upstream_error());
        }
        Ok(())
    }
}

#[async_trait]
impl MusicProvider for MockProvider {
    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>, SpotifyError> {
        self.enter(token, "").await?;
        if self.top_tracks_fail {
            return Err(upstream_error());
        }
        Ok(self.top_tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn related_artists(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Artist>, SpotifyError> {
        self.enter(token, artist_id).await?;
        if self.related_failing.contains(artist_id) {
            return Err(upstream_error());
        }
        Ok(self.related.get(artist_id).cloned().unwrap_or_default())
    }

    async fn artist_top_tracks(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.enter(token, artist_id).await?;
        Ok(self.artist_tracks.get(artist_id).cloned().unwrap_or_default())
    }

    async fn new_releases(&self, token: &str, limit: u32) -> Result<Vec<Album>, SpotifyError> {
        self.enter(token, "").await?;
        if self.new_releases_fail {
            return Err(upstream_error());
        }
        Ok(self
            .new_releases
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn search_tracks(
        &self,
        token: &str,
        _query: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.enter(token, "").await?;
        Ok(self
            .search_hits
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn recommendations(
        &self,
        token: &str,
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        for seed in seed_tracks {
            self.enter(token, seed).await?;
        }
        Ok(self
            .recommended
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        self.enter(token, "").await?;
        Ok(UserProfile {
            id: "listener".to_string(),
            display_name: Some("Listener".to_string()),
            email: None,
            images: None,
            country: Some("DE".to_string()),
            followers: None,
            product: Some("premium".to_string()),
        })
    }

    async fn saved_tracks(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SavedTrack>, SpotifyError> {
        self.enter(token, "").await?;
        Ok(self
            .saved
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn save_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError> {
        self.enter(token, track_id).await
    }

    async fn remove_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError> {
        self.enter(token, track_id).await
    }

    async fn playlists(&self, token: &str, _limit: u32) -> Result<Vec<Playlist>, SpotifyError> {
        self.enter(token, "").await?;
        Ok(Vec::new())
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, SpotifyError> {
        self.enter(token, playlist_id).await?;
        Ok(self.playlist_items.clone())
    }

    async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, SpotifyError> {
        self.enter(token, user_id).await?;
        Ok(CreatePlaylistResponse {
            id: "new-playlist".to_string(),
            name: request.name.clone(),
            description: Some(request.description.clone()),
            images: None,
        })
    }

    async fn add_tracks_to_playlist(
        &self,
        token: &str,
        playlist_id: &str,
        _uris: &[String],
    ) -> Result<(), SpotifyError> {
        self.enter(token, playlist_id).await
    }
}

/// Accounts-service stand-in that rotates refresh tokens: every refresh
/// token is accepted once and replaced by `r<n>`.
#[derive(Clone, Default)]
pub struct TokenEndpoint {
    valid: Arc<Mutex<HashSet<String>>>,
    calls: Arc<AtomicUsize>,
}

impl TokenEndpoint {
    pub fn accepting(refresh_token: &str) -> Self {
        let endpoint = Self::default();
        endpoint
            .valid
            .lock()
            .unwrap()
            .insert(refresh_token.to_string());
        endpoint
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Serves the endpoint on an ephemeral port and returns its token URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/api/token", post(rotate_refresh_token))
            .with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/token", addr)
    }
}

async fn rotate_refresh_token(
    State(endpoint): State<TokenEndpoint>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let n = endpoint.calls.fetch_add(1, Ordering::SeqCst) + 1;
    // keep the refresh in flight long enough for concurrent callers to pile up
    tokio::time::sleep(Duration::from_millis(50)).await;

    let presented = form.get("refresh_token").cloned().unwrap_or_default();
    let accepted = endpoint.valid.lock().unwrap().remove(&presented);
    if !accepted {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }

    let next = format!("r{}", n);
    endpoint.valid.lock().unwrap().insert(next.clone());
    Json(json!({
        "access_token": format!("access-{}", n),
        "refresh_token": next,
        "expires_in": 3600,
        "scope": "user-top-read",
    }))
    .into_response()
}

/// A URL on a port nothing listens on.
pub async fn unreachable_token_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/token", addr)
}
