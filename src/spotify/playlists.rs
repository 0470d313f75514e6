use reqwest::Method;

use crate::types::{
    AddTrackToPlaylistRequest, CreatePlaylistRequest, CreatePlaylistResponse, Paging, Playlist,
    PlaylistItem,
};

use super::{SpotifyClient, SpotifyError};

/// Spotify accepts at most 100 URIs per add-tracks request.
const MAX_URIS_PER_REQUEST: usize = 100;

impl SpotifyClient {
    pub async fn get_playlists(
        &self,
        token: &str,
        limit: u32,
    ) -> Result<Vec<Playlist>, SpotifyError> {
        let res: Paging<Playlist> = self
            .get_json(token, "/me/playlists", &[("limit", limit.to_string())])
            .await?;
        Ok(res.items)
    }

    pub async fn get_playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, SpotifyError> {
        let res: Paging<PlaylistItem> = self
            .get_json(token, &format!("/playlists/{}/tracks", playlist_id), &[])
            .await?;
        Ok(res.items)
    }

    /// Creates a playlist owned by `user_id`.
    ///
    /// # Example
    ///
    /// ```
    /// let request = CreatePlaylistRequest {
    ///     name: "Hidden gems".to_string(),
    ///     description: String::new(),
    ///     public: false,
    /// };
    /// let playlist = client.post_playlist(token, "listener", &request).await?;
    /// ```
    pub async fn post_playlist(
        &self,
        token: &str,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, SpotifyError> {
        let response = self
            .send_json(
                Method::POST,
                token,
                &format!("/users/{}/playlists", user_id),
                request,
            )
            .await?;
        Ok(response.json::<CreatePlaylistResponse>().await?)
    }

    /// Appends tracks to a playlist, batching the URIs in groups of 100.
    pub async fn post_playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError> {
        for chunk in uris.chunks(MAX_URIS_PER_REQUEST) {
            let body = AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            };
            self.send_json(
                Method::POST,
                token,
                &format!("/playlists/{}/tracks", playlist_id),
                &body,
            )
            .await?;
        }
        Ok(())
    }
}
