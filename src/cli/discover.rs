use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng};
use tabled::Table;

use crate::{
    discovery::{self, DiscoveryOptions, DiscoverySource},
    error,
    spotify::SpotifyClient,
    success,
    types::TrackTableRow,
    warning,
};

/// Runs the deep graph engine once against a raw access token and prints
/// the result as a table.
pub async fn discover(token: String) {
    let client = match SpotifyClient::from_env() {
        Ok(client) => client,
        Err(e) => error!("Failed to build Spotify client. Err: {}", e),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message("Digging through related artists...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let options = DiscoveryOptions::from_env();
    let mut rng = StdRng::from_os_rng();
    let result = discovery::discover(&client, &token, &options, &mut rng).await;
    pb.finish_and_clear();

    let found = match result {
        Ok(found) => found,
        Err(e) => error!("Failed to fetch recommendations. Err: {}", e),
    };

    if found.source == DiscoverySource::NewReleases {
        warning!("No personal seeds available, showing new releases instead");
    }

    if found.tracks.is_empty() {
        success!("Nothing new to discover right now.");
        return;
    }

    let rows: Vec<TrackTableRow> = found
        .tracks
        .into_iter()
        .map(|t| TrackTableRow {
            title: t.title,
            artist: t.artist,
            album: t.album,
            popularity: t.popularity,
        })
        .collect();

    let count = rows.len();
    println!("{}", Table::new(rows));
    success!("Found {} tracks", count);
}
