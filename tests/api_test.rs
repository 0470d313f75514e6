mod common;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE, VARY},
    },
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use common::{MockProvider, album, playlist_items_with_local_file, track, unreachable_token_url};
use gemfinder::{
    server::{self, AppState, router},
    spotify::SpotifyAuth,
    types::Token,
    utils,
};
use serde_json::Value;
use tower::ServiceExt;

fn auth_with_token_url(token_url: String) -> SpotifyAuth {
    SpotifyAuth::new(
        "client-id".to_string(),
        "http://127.0.0.1:3000/api/auth/callback".to_string(),
        "user-top-read".to_string(),
        "https://accounts.spotify.com/authorize",
        token_url,
        Duration::from_secs(1),
    )
    .unwrap()
}

fn test_state(provider: Arc<MockProvider>) -> AppState {
    let auth = auth_with_token_url("http://127.0.0.1:9/api/token".to_string());
    AppState::new(provider, auth, "http://127.0.0.1:3000".to_string())
}

fn graph_provider() -> MockProvider {
    MockProvider::with_top_tracks(vec![track("seed", "A", 60)])
        .related_to("A", &["B"])
        .tracks_of("A", vec![track("a1", "A", 10), track("a2", "A", 90)])
        .tracks_of("B", vec![track("b1", "B", 20)])
}

async fn fresh_session(state: &AppState) -> String {
    state
        .sessions
        .create(Token {
            access_token: "session-token".to_string(),
            refresh_token: "refresh".to_string(),
            scope: String::new(),
            expires_in: 3600,
            obtained_at: utils::now_timestamp(),
        })
        .await
}

async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: Router, uri: &str, cookie: &str, body: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(COOKIE, cookie)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(router(state), "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_recommendations_without_cookies_is_unauthorized() {
    let provider = Arc::new(graph_provider());
    let state = test_state(provider.clone());
    let response = get(router(state), "/api/recommendations", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
    assert!(provider.tokens().is_empty());
}

#[tokio::test]
async fn test_recommendations_with_session() {
    let provider = Arc::new(graph_provider());
    let state = test_state(provider.clone());
    let session_id = fresh_session(&state).await;

    let response = get(
        router(state),
        "/api/recommendations",
        Some(&format!("sp_session={}", session_id)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(VARY).unwrap(), "Cookie");

    let body = json_body(response).await;
    let tracks = body.as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    for t in tracks {
        assert!(t["popularity"].as_u64().unwrap() < 80);
        assert_eq!(t["duration"], "3:35");
        assert!(t["coverUrl"].as_str().unwrap().starts_with("https://img.test/"));
    }
    assert!(provider.tokens().iter().all(|t| t == "session-token"));
}

#[tokio::test]
async fn test_recommendations_with_legacy_token_cookie() {
    let provider = Arc::new(graph_provider());
    let state = test_state(provider.clone());
    let cookie = format!("sp_token={}", STANDARD.encode("cookie-token"));

    let response = get(router(state), "/api/recommendations", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(provider.tokens().iter().all(|t| t == "cookie-token"));
}

#[tokio::test]
async fn test_unknown_session_without_token_cookies_is_unauthorized() {
    let state = test_state(Arc::new(graph_provider()));
    let response = get(
        router(state),
        "/api/recommendations",
        Some("sp_session=does-not-exist"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recommendations_fall_back_to_new_releases() {
    let mut provider = MockProvider::default();
    provider.new_releases = vec![album("n1", "X"), album("n2", "Y")];
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/recommendations", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["id"], "n1");
    assert_eq!(body[1]["id"], "n2");
}

#[tokio::test]
async fn test_recommendations_upstream_failure_is_bad_gateway() {
    let mut provider = MockProvider::default();
    provider.top_tracks_fail = true;
    provider.new_releases_fail = true;
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/recommendations", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        json_body(response).await["error"],
        "Failed to fetch recommendations"
    );
}

#[tokio::test]
async fn test_spotify_unauthorized_maps_to_unauthorized() {
    let mut provider = MockProvider::default();
    provider.unauthorized = true;
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/profile", Some("access_token=stale")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_seed_recommendations_require_track_id() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(
        router(state),
        "/api/recommendations/seed",
        Some("access_token=raw"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "trackId required");
}

#[tokio::test]
async fn test_search_requires_query() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(router(state), "/api/search?q=", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Query required");
}

#[tokio::test]
async fn test_search_returns_hit_and_related() {
    let mut provider = MockProvider::default();
    provider.search_hits = vec![track("hit", "A", 70)];
    provider.recommended = vec![track("r1", "B", 30), track("r2", "C", 40)];
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/search?q=gems", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["tracks"][0]["id"], "hit");
    assert_eq!(body["related"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_save_track_requires_track_id() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = post_json(router(state), "/api/library/save", "access_token=raw", "{}").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Track ID required");
}

#[tokio::test]
async fn test_create_playlist() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = post_json(
        router(state),
        "/api/playlists/create",
        "access_token=raw",
        r#"{"name":"Gems","description":"found today"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], "new-playlist");
    assert_eq!(body["name"], "Gems");
}

#[tokio::test]
async fn test_login_redirects_with_pkce_challenge() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(router(state), "/api/auth/login", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("https://accounts.spotify.com/authorize?"));
    assert!(location.contains("code_challenge_method=S256"));
    assert!(location.contains("state="));
}

#[tokio::test]
async fn test_callback_with_unknown_state_is_rejected() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(
        router(state),
        "/api/auth/callback?code=abc&state=forged",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_with_denied_authorization_is_rejected() {
    let state = test_state(Arc::new(MockProvider::default()));
    let response = get(
        router(state),
        "/api/auth/callback?error=access_denied",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_drops_session_and_expires_cookies() {
    let state = test_state(Arc::new(MockProvider::default()));
    let session_id = fresh_session(&state).await;
    let cookie = format!("sp_session={}; sp_token.0=YWJj; sp_token.1=MTIz", session_id);

    let response = get(router(state.clone()), "/api/auth/logout", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "http://127.0.0.1:3000/"
    );

    let expired: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(expired.len(), 6);
    assert!(expired.iter().all(|c| c.contains("Max-Age=0")));
    assert!(expired.iter().any(|c| c.starts_with("sp_token.1=")));

    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_profile_lists_distinct_top_artists() {
    let provider = MockProvider::with_top_tracks(vec![
        track("t1", "A", 50),
        track("t2", "B", 50),
        track("t3", "A", 50),
    ]);
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/profile", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["profile"]["displayName"], "Listener");
    assert_eq!(body["profile"]["followers"], 0);
    assert_eq!(body["topArtists"].as_array().unwrap().len(), 2);
    assert_eq!(body["topTracks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_expired_session_with_failed_refresh_is_unauthorized() {
    let provider = Arc::new(graph_provider());
    let auth = auth_with_token_url(unreachable_token_url().await);
    let state = AppState::new(provider.clone(), auth, "http://127.0.0.1:3000".to_string());
    let session_id = state
        .sessions
        .create(Token {
            access_token: "stale".to_string(),
            refresh_token: "refresh".to_string(),
            scope: String::new(),
            expires_in: 3600,
            obtained_at: utils::now_timestamp() - 7200,
        })
        .await;

    let response = get(
        router(state.clone()),
        "/api/recommendations",
        Some(&format!("sp_session={}", session_id)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.sessions.len().await, 0);
    assert!(provider.tokens().is_empty());
}

#[tokio::test]
async fn test_playlist_tracks_skip_local_files() {
    let mut provider = MockProvider::default();
    provider.playlist_items = playlist_items_with_local_file();
    let state = test_state(Arc::new(provider));

    let response = get(router(state), "/api/playlists/p1", Some("access_token=raw")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let tracks = body.as_array().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["id"], "4uLU6hMCjMI75M1A2tKUQC");
    assert_eq!(tracks[0]["artist"], "Rick Astley");
    assert_eq!(tracks[0]["addedAt"], "2025-02-01T12:00:00Z");
}

#[tokio::test]
async fn test_server_accepts_connections_once_bound() {
    let state = test_state(Arc::new(MockProvider::default()));
    let listener = server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        server::serve(listener, state).await.unwrap();
    });

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}
