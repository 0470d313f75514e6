use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    server::AppState,
    types::{SearchView, Track, TrackView},
    utils, warning,
};

use super::{ApiError, BearerToken};

const RELATED_LIMIT: u32 = 20;

fn to_views(tracks: &[Track]) -> Vec<TrackView> {
    tracks.iter().map(utils::to_track_view).collect()
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Finds the best matching track and a set of related tracks seeded by it.
///
/// A failing related-tracks call still returns the hit with an empty
/// `related` list.
pub async fn search(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchView>, ApiError> {
    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(ApiError::BadRequest("Query required".to_string()));
    };

    let hits = state
        .provider
        .search_tracks(&token, &query, 1)
        .await
        .map_err(|e| ApiError::from_spotify("Spotify Search failed", e))?;

    let Some(seed) = hits.first() else {
        return Ok(Json(SearchView {
            tracks: Vec::new(),
            related: Vec::new(),
        }));
    };

    let related = match state
        .provider
        .recommendations(&token, &[seed.id.clone()], RELATED_LIMIT)
        .await
    {
        Ok(tracks) => tracks,
        Err(e) => {
            warning!("Related tracks for '{}' unavailable: {}", query, e);
            Vec::new()
        }
    };

    Ok(Json(SearchView {
        tracks: to_views(&hits),
        related: to_views(&related),
    }))
}
