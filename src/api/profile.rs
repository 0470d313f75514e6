use std::collections::HashSet;

use axum::{Json, extract::State};

use crate::{
    server::AppState,
    types::{ProfileSummary, ProfileView, TopArtist, TopTrack, Track, UserProfile},
    utils,
};

use super::{ApiError, BearerToken};

const PROFILE_TOP_TRACKS: u32 = 10;
const PROFILE_TOP_ARTISTS: usize = 10;

fn summarize(profile: UserProfile) -> ProfileSummary {
    ProfileSummary {
        display_name: profile.display_name.unwrap_or_else(|| "User".to_string()),
        email: profile.email,
        image: profile
            .images
            .as_deref()
            .map(utils::first_image_url)
            .unwrap_or_default(),
        country: profile.country.unwrap_or_else(|| "N/A".to_string()),
        followers: profile.followers.map(|f| f.total).unwrap_or(0),
        product: profile.product.unwrap_or_else(|| "free".to_string()),
    }
}

/// Distinct artists in order of first appearance across the tracks.
pub fn top_artists(tracks: &[Track], limit: usize) -> Vec<TopArtist> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter(|a| seen.insert(a.id.clone()))
        .take(limit)
        .map(|a| TopArtist {
            id: a.id.clone(),
            name: a.name.clone(),
            image: String::new(),
        })
        .collect()
}

pub async fn profile(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<ProfileView>, ApiError> {
    let (profile, top_tracks) = tokio::join!(
        state.provider.current_user(&token),
        state.provider.top_tracks(&token, PROFILE_TOP_TRACKS),
    );

    let profile = profile.map_err(|e| ApiError::from_spotify("Failed to fetch profile", e))?;
    let top_tracks =
        top_tracks.map_err(|e| ApiError::from_spotify("Failed to fetch profile", e))?;

    Ok(Json(ProfileView {
        profile: summarize(profile),
        top_artists: top_artists(&top_tracks, PROFILE_TOP_ARTISTS),
        top_tracks: top_tracks
            .iter()
            .map(|t| TopTrack {
                id: t.id.clone(),
                title: t.name.clone(),
                artist: utils::join_artist_names(t),
                cover_url: t
                    .album
                    .as_ref()
                    .map(|a| utils::first_image_url(&a.images))
                    .unwrap_or_default(),
            })
            .collect(),
    }))
}
