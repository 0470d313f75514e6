use crate::types::{Artist, RelatedArtistsResponse, Track, TracksResponse};

use super::{SpotifyClient, SpotifyError};

impl SpotifyClient {
    /// Retrieves the artists Spotify considers related to `artist_id`.
    ///
    /// Uses the `/artists/{id}/related-artists` endpoint, which returns up to
    /// 20 artists ordered by similarity. Callers that only want the closest
    /// neighbours should take a prefix of the result.
    ///
    /// # Example
    ///
    /// ```
    /// let related = client.get_related_artists(token, "4NHQUGzhtTLFvgF5SZesLK").await?;
    /// let closest: Vec<_> = related.iter().take(4).collect();
    /// ```
    pub async fn get_related_artists(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Artist>, SpotifyError> {
        let res: RelatedArtistsResponse = self
            .get_json(token, &format!("/artists/{}/related-artists", artist_id), &[])
            .await?;
        Ok(res.artists)
    }

    /// Retrieves an artist's top tracks in the listener's market.
    ///
    /// The market is derived from the token (`market=from_token`), so the
    /// result matches what the listener can actually play.
    pub async fn get_artist_top_tracks(
        &self,
        token: &str,
        artist_id: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        let res: TracksResponse = self
            .get_json(
                token,
                &format!("/artists/{}/top-tracks", artist_id),
                &[("market", "from_token".to_string())],
            )
            .await?;
        Ok(res.tracks)
    }
}
