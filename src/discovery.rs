//! # Deep Graph Discovery
//!
//! Builds a list of moderately popular tracks around the listener's taste:
//!
//! ```text
//! top tracks (short term)
//!     ↓ primary artist of each track
//! seed artists ── pick 3 at random
//!     ↓ related artists (concurrent, first 4 each)
//! artist pool (deduplicated)
//!     ↓ top tracks per artist (concurrent)
//! candidates ── popularity < 80, dedup by id, shuffle, take 20
//! ```
//!
//! Individual related-artist or top-track calls may fail or time out; they
//! simply contribute nothing. Whenever the graph yields nothing usable the
//! engine answers with the current new releases instead. Only a failing
//! new-releases call after that is reported as an error.

use std::{fmt, time::Duration};

use futures::future::join_all;
use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};

use crate::{
    config,
    spotify::{MusicProvider, SpotifyError},
    types::{Album, Track, TrackView},
    utils, warning,
};

/// Popularity reported for new-release fallback entries.
pub const FALLBACK_POPULARITY: u32 = 50;

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Number of top tracks the seeds are drawn from.
    pub seed_window: u32,
    pub seed_count: usize,
    pub related_per_seed: usize,
    /// Tracks at or above this popularity are dropped.
    pub popularity_ceiling: u32,
    pub max_results: usize,
    pub fallback_limit: u32,
    /// Upper bound for each fan-out call.
    pub call_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            seed_window: 5,
            seed_count: 3,
            related_per_seed: 4,
            popularity_ceiling: 80,
            max_results: 20,
            fallback_limit: 20,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl DiscoveryOptions {
    pub fn from_env() -> Self {
        Self {
            call_timeout: config::request_timeout(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Graph,
    NewReleases,
}

#[derive(Debug, Clone)]
pub struct Discovery {
    pub tracks: Vec<TrackView>,
    pub source: DiscoverySource,
}

#[derive(Debug)]
pub enum DiscoveryError {
    /// Neither the personalised path nor the new-releases fallback produced
    /// anything. `seed` is set when the top-tracks call itself failed.
    UpstreamUnavailable {
        seed: Option<SpotifyError>,
        fallback: SpotifyError,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::UpstreamUnavailable {
                seed: Some(seed),
                fallback,
            } => write!(
                f,
                "failed to fetch seeds ({}) and new releases ({})",
                seed, fallback
            ),
            DiscoveryError::UpstreamUnavailable {
                seed: None,
                fallback,
            } => write!(f, "failed to fetch new releases ({})", fallback),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Runs the full discovery for one listener.
///
/// `rng` drives seed selection and the final shuffle; pass a seeded
/// `StdRng` for reproducible results.
pub async fn discover<R: Rng + ?Sized>(
    provider: &dyn MusicProvider,
    token: &str,
    options: &DiscoveryOptions,
    rng: &mut R,
) -> Result<Discovery, DiscoveryError> {
    let top_tracks = match provider.top_tracks(token, options.seed_window).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warning!("Failed to fetch seed tracks, using new releases: {}", e);
            return new_releases_fallback(provider, token, options, Some(e)).await;
        }
    };

    let seeds = seed_artists(&top_tracks);
    if seeds.is_empty() {
        return new_releases_fallback(provider, token, options, None).await;
    }

    let selected = select_seeds(&seeds, options.seed_count, &mut *rng);
    let (pool, failed_related) = expand_artist_pool(provider, token, &selected, options).await;
    let (mut candidates, failed_tracks) = collect_candidates(provider, token, &pool, options).await;

    let failed = failed_related + failed_tracks;
    if failed > 0 {
        warning!(
            "{} of {} graph calls failed and were skipped",
            failed,
            selected.len() + pool.len()
        );
    }

    utils::remove_duplicate_tracks(&mut candidates);
    if candidates.is_empty() {
        return new_releases_fallback(provider, token, options, None).await;
    }

    candidates.shuffle(&mut *rng);
    candidates.truncate(options.max_results);

    Ok(Discovery {
        tracks: candidates.iter().map(utils::to_track_view).collect(),
        source: DiscoverySource::Graph,
    })
}

/// Distinct primary-artist ids of the given tracks, in track order.
pub fn seed_artists(tracks: &[Track]) -> Vec<String> {
    let mut ids: Vec<String> = tracks
        .iter()
        .filter_map(|t| t.artists.first())
        .map(|a| a.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    utils::dedup_ids(&mut ids);
    ids
}

/// Picks `count` distinct seeds at random, or all of them when there are fewer.
pub fn select_seeds<R: Rng + ?Sized>(seeds: &[String], count: usize, rng: &mut R) -> Vec<String> {
    seeds.choose_multiple(rng, count).cloned().collect()
}

async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, SpotifyError>
where
    F: Future<Output = Result<T, SpotifyError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(SpotifyError::Timeout))
}

/// Seeds plus up to `related_per_seed` related artists of each seed,
/// deduplicated. Returns the pool and the number of failed calls.
pub async fn expand_artist_pool(
    provider: &dyn MusicProvider,
    token: &str,
    seeds: &[String],
    options: &DiscoveryOptions,
) -> (Vec<String>, usize) {
    let calls = seeds.iter().map(|seed| {
        with_timeout(options.call_timeout, provider.related_artists(token, seed))
    });
    let responses = join_all(calls).await;

    let mut pool = seeds.to_vec();
    let mut failed = 0;
    for response in responses {
        match response {
            Ok(artists) => pool.extend(
                artists
                    .into_iter()
                    .map(|a| a.id)
                    .filter(|id| !id.is_empty())
                    .take(options.related_per_seed),
            ),
            Err(_) => failed += 1,
        }
    }

    utils::dedup_ids(&mut pool);
    (pool, failed)
}

/// Top tracks of every pool artist below the popularity ceiling, in pool
/// order. Returns the tracks and the number of failed calls.
pub async fn collect_candidates(
    provider: &dyn MusicProvider,
    token: &str,
    pool: &[String],
    options: &DiscoveryOptions,
) -> (Vec<Track>, usize) {
    let calls = pool.iter().map(|artist_id| {
        with_timeout(
            options.call_timeout,
            provider.artist_top_tracks(token, artist_id),
        )
    });
    let responses = join_all(calls).await;

    let mut candidates = Vec::new();
    let mut failed = 0;
    for response in responses {
        match response {
            Ok(tracks) => candidates.extend(
                tracks
                    .into_iter()
                    .filter(|t| t.popularity < options.popularity_ceiling),
            ),
            Err(_) => failed += 1,
        }
    }

    (candidates, failed)
}

async fn new_releases_fallback(
    provider: &dyn MusicProvider,
    token: &str,
    options: &DiscoveryOptions,
    seed_error: Option<SpotifyError>,
) -> Result<Discovery, DiscoveryError> {
    match provider.new_releases(token, options.fallback_limit).await {
        Ok(albums) => Ok(Discovery {
            tracks: albums
                .iter()
                .take(options.max_results)
                .map(album_to_track_view)
                .collect(),
            source: DiscoverySource::NewReleases,
        }),
        Err(fallback) => Err(DiscoveryError::UpstreamUnavailable {
            seed: seed_error,
            fallback,
        }),
    }
}

/// New releases are albums; they are shown in the track shape with the album
/// name as title and a neutral popularity.
pub fn album_to_track_view(album: &Album) -> TrackView {
    TrackView {
        id: album.id.clone(),
        title: album.name.clone(),
        artist: album
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        album: album.name.clone(),
        cover_url: utils::first_image_url(&album.images),
        duration: utils::format_duration(None),
        popularity: FALLBACK_POPULARITY,
    }
}
