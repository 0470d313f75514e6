use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{server::AppState, types::LibraryTrack, utils};

use super::{ApiError, BearerToken};

const LIBRARY_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackIdBody {
    pub track_id: Option<String>,
}

fn required_track_id(body: TrackIdBody) -> Result<String, ApiError> {
    body.track_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Track ID required".to_string()))
}

/// The first page of the listener's liked songs.
pub async fn library(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<LibraryTrack>>, ApiError> {
    let saved = state
        .provider
        .saved_tracks(&token, LIBRARY_PAGE_SIZE, 0)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to fetch library", e))?;

    Ok(Json(
        saved
            .iter()
            .map(|item| utils::to_library_track(&item.track, &item.added_at))
            .collect(),
    ))
}

pub async fn save_track(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(body): Json<TrackIdBody>,
) -> Result<Json<Value>, ApiError> {
    let track_id = required_track_id(body)?;
    state
        .provider
        .save_track(&token, &track_id)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to save track", e))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn remove_track(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(body): Json<TrackIdBody>,
) -> Result<Json<Value>, ApiError> {
    let track_id = required_track_id(body)?;
    state
        .provider
        .remove_track(&token, &track_id)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to remove track", e))?;
    Ok(Json(json!({ "success": true })))
}
