use axum::{
    Json,
    extract::{Query, State},
    http::header::VARY,
    response::IntoResponse,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::{discovery, server::AppState, types::TrackView, utils};

use super::{ApiError, BearerToken};

const SEED_RECOMMENDATION_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedParams {
    pub track_id: Option<String>,
}

/// Deep graph recommendations for the logged-in listener.
pub async fn recommendations(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let mut rng = StdRng::from_os_rng();
    let discovery =
        discovery::discover(state.provider.as_ref(), &token, &state.discovery, &mut rng).await?;

    Ok(([(VARY, "Cookie")], Json(discovery.tracks)))
}

/// Spotify's own recommendations seeded by a single track.
pub async fn seed_recommendations(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Query(params): Query<SeedParams>,
) -> Result<Json<Vec<TrackView>>, ApiError> {
    let Some(track_id) = params.track_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("trackId required".to_string()));
    };

    let tracks = state
        .provider
        .recommendations(&token, &[track_id], SEED_RECOMMENDATION_LIMIT)
        .await
        .map_err(|e| ApiError::from_spotify("Failed to fetch recommendations", e))?;

    Ok(Json(tracks.iter().map(utils::to_track_view).collect()))
}
