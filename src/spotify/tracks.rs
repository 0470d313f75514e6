use crate::types::{Album, NewReleasesResponse, Paging, SearchResponse, Track, TracksResponse};

use super::{SpotifyClient, SpotifyError};

impl SpotifyClient {
    /// The listener's most played tracks over roughly the last four weeks.
    pub async fn get_top_tracks(
        &self,
        token: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        let res: Paging<Track> = self
            .get_json(
                token,
                "/me/top/tracks",
                &[
                    ("time_range", "short_term".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(res.items)
    }

    pub async fn get_new_releases(
        &self,
        token: &str,
        limit: u32,
    ) -> Result<Vec<Album>, SpotifyError> {
        let res: NewReleasesResponse = self
            .get_json(token, "/browse/new-releases", &[("limit", limit.to_string())])
            .await?;
        Ok(res.albums.items)
    }

    /// Searches the catalogue for tracks matching `query`.
    ///
    /// A response without a `tracks` section is treated as no hits.
    pub async fn search(
        &self,
        token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        let res: SearchResponse = self
            .get_json(
                token,
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(res.tracks.map(|t| t.items).unwrap_or_default())
    }

    /// Track recommendations seeded by up to five track ids.
    pub async fn get_recommendations(
        &self,
        token: &str,
        seed_tracks: &[String],
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        if seed_tracks.is_empty() {
            return Ok(Vec::new());
        }

        let seeds = seed_tracks
            .iter()
            .take(5)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let res: TracksResponse = self
            .get_json(
                token,
                "/recommendations",
                &[("seed_tracks", seeds), ("limit", limit.to_string())],
            )
            .await?;
        Ok(res.tracks)
    }
}
