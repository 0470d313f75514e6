use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    server::AppState,
    types::{CreatePlaylistRequest, CreatePlaylistResponse, LibraryTrack, Playlist, PlaylistView},
    utils,
};

use super::{ApiError, BearerToken};

const PLAYLIST_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTracksBody {
    pub track_uris: Option<Vec<String>>,
}

fn to_playlist_view(playlist: Playlist) -> PlaylistView {
    PlaylistView {
        id: playlist.id,
        name: playlist.name,
        description: playlist.description.unwrap_or_default(),
        images: playlist.images.unwrap_or_default(),
        track_count: playlist.tracks.map(|t| t.total).unwrap_or(0),
        owner: playlist
            .owner
            .and_then(|o| o.display_name)
            .unwrap_or_default(),
        is_public: playlist.public.unwrap_or(false),
    }
}

pub async fn playlists(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<PlaylistView>>, ApiError> {
    let playlists = state
        .provider
        .playlists(&token, PLAYLIST_PAGE_SIZE)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to fetch playlists", e))?;

    Ok(Json(playlists.into_iter().map(to_playlist_view).collect()))
}

/// Tracks of one playlist; local files and removed tracks are skipped.
pub async fn playlist_tracks(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<LibraryTrack>>, ApiError> {
    let items = state
        .provider
        .playlist_tracks(&token, &playlist_id)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to fetch playlist tracks", e))?;

    Ok(Json(
        items
            .iter()
            .filter_map(|item| {
                item.track
                    .as_ref()
                    .filter(|t| !t.id.is_empty())
                    .map(|t| utils::to_library_track(t, &item.added_at))
            })
            .collect(),
    ))
}

/// Creates a playlist for the logged-in listener; private unless asked otherwise.
pub async fn create_playlist(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(body): Json<CreatePlaylistBody>,
) -> Result<Json<CreatePlaylistResponse>, ApiError> {
    let Some(name) = body.name.filter(|n| !n.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Playlist name required".to_string()));
    };

    let user = state
        .provider
        .current_user(&token)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to create playlist", e))?;

    let request = CreatePlaylistRequest {
        name,
        description: body.description.unwrap_or_default(),
        public: body.is_public.unwrap_or(false),
    };

    let created = state
        .provider
        .create_playlist(&token, &user.id, &request)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to create playlist", e))?;

    Ok(Json(created))
}

pub async fn add_to_playlist(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(playlist_id): Path<String>,
    Json(body): Json<AddTracksBody>,
) -> Result<Json<Value>, ApiError> {
    let Some(uris) = body.track_uris else {
        return Err(ApiError::BadRequest("Track URIs required".to_string()));
    };

    state
        .provider
        .add_tracks_to_playlist(&token, &playlist_id, &uris)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to add tracks", e))?;

    Ok(Json(json!({ "success": true })))
}
