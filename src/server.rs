use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;

use crate::{
    Res, api, config,
    discovery::DiscoveryOptions,
    info,
    management::SessionManager,
    spotify::{MusicProvider, SpotifyAuth, SpotifyClient},
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MusicProvider>,
    pub auth: Arc<SpotifyAuth>,
    pub sessions: SessionManager,
    pub discovery: DiscoveryOptions,
    /// Public base URL without a trailing slash.
    pub app_url: String,
    /// Lifetime of the `sp_session` cookie in seconds.
    pub session_max_age: u64,
}

impl AppState {
    pub fn new(provider: Arc<dyn MusicProvider>, auth: SpotifyAuth, app_url: String) -> Self {
        let session_max_age = config::session_max_age();
        Self {
            provider,
            auth: Arc::new(auth),
            sessions: SessionManager::with_max_age(session_max_age),
            discovery: DiscoveryOptions::default(),
            app_url: app_url.trim_end_matches('/').to_string(),
            session_max_age,
        }
    }

    pub fn from_env() -> Res<Self> {
        let provider = SpotifyClient::from_env()?;
        let auth = SpotifyAuth::from_env()?;

        let mut state = Self::new(Arc::new(provider), auth, config::app_url());
        state.discovery = DiscoveryOptions::from_env();
        Ok(state)
    }

    /// Cookies get the `Secure` attribute only when served over https.
    pub fn secure_cookies(&self) -> bool {
        self.app_url.starts_with("https://")
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/auth/login", get(api::login))
        .route("/api/auth/callback", get(api::callback))
        .route("/api/auth/logout", get(api::logout).post(api::logout))
        .route("/api/recommendations", get(api::recommendations))
        .route("/api/recommendations/seed", get(api::seed_recommendations))
        .route("/api/search", get(api::search))
        .route("/api/profile", get(api::profile))
        .route("/api/library", get(api::library))
        .route("/api/library/save", post(api::save_track))
        .route("/api/library/remove", post(api::remove_track))
        .route("/api/playlists", get(api::playlists))
        .route("/api/playlists/create", post(api::create_playlist))
        .route("/api/playlists/{id}", get(api::playlist_tracks))
        .route("/api/playlists/{id}/add", post(api::add_to_playlist))
        .with_state(state)
}

/// Binds the listening socket; the server accepts connections once
/// [`serve`] runs on it.
pub async fn bind(addr: &str) -> Res<TcpListener> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address '{}': {}", addr, e))?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Res<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn start_api_server(state: AppState, addr: &str) -> Res<()> {
    let listener = bind(addr).await?;
    serve(listener, state).await
}
