use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{Image, LibraryTrack, Track, TrackView};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque identifier for sessions and OAuth `state` values.
pub fn generate_session_id() -> String {
    random_alphanumeric(32)
}

pub fn now_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration(duration_ms: Option<u64>) -> String {
    let total_secs = duration_ms.unwrap_or(0) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn first_image_url(images: &[Image]) -> String {
    images.first().map(|i| i.url.clone()).unwrap_or_default()
}

pub fn join_artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keeps the first occurrence of every track id, preserving order.
pub fn remove_duplicate_tracks(tracks: &mut Vec<Track>) {
    let mut seen_ids = HashSet::new();
    tracks.retain(|track| seen_ids.insert(track.id.clone()));
}

/// Keeps the first occurrence of every id, preserving order.
pub fn dedup_ids(ids: &mut Vec<String>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

pub fn to_track_view(track: &Track) -> TrackView {
    let (album, cover_url) = match &track.album {
        Some(album) => (album.name.clone(), first_image_url(&album.images)),
        None => (UNKNOWN_ALBUM.to_string(), String::new()),
    };

    TrackView {
        id: track.id.clone(),
        title: track.name.clone(),
        artist: track
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album,
        cover_url,
        duration: format_duration(track.duration_ms),
        popularity: track.popularity,
    }
}

pub fn to_library_track(track: &Track, added_at: &str) -> LibraryTrack {
    let (album, cover_url) = match &track.album {
        Some(album) => (album.name.clone(), first_image_url(&album.images)),
        None => (String::new(), String::new()),
    };

    LibraryTrack {
        id: track.id.clone(),
        title: track.name.clone(),
        artist: join_artist_names(track),
        album,
        cover_url,
        added_at: added_at.to_string(),
    }
}
