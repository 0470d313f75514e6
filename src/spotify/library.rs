use reqwest::Method;

use crate::types::{Paging, SavedTrack, SavedTracksRequest, UserProfile};

use super::{SpotifyClient, SpotifyError};

impl SpotifyClient {
    pub async fn get_current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        self.get_json(token, "/me", &[]).await
    }

    /// One page of the listener's liked songs, newest first.
    pub async fn get_saved_tracks(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SavedTrack>, SpotifyError> {
        let res: Paging<SavedTrack> = self
            .get_json(
                token,
                "/me/tracks",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(res.items)
    }

    pub async fn put_saved_track(&self, token: &str, track_id: &str) -> Result<(), SpotifyError> {
        let body = SavedTracksRequest {
            ids: vec![track_id.to_string()],
        };
        self.send_json(Method::PUT, token, "/me/tracks", &body).await?;
        Ok(())
    }

    pub async fn delete_saved_track(
        &self,
        token: &str,
        track_id: &str,
    ) -> Result<(), SpotifyError> {
        let body = SavedTracksRequest {
            ids: vec![track_id.to_string()],
        };
        self.send_json(Method::DELETE, token, "/me/tracks", &body).await?;
        Ok(())
    }
}
