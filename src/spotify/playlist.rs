use crate::{
    error::MatchError,
    spotify::{SpotifyClient, send},
    types::{PlaylistSnapshotResponse, PlaylistTracksRequest, track_uri},
};

/// Spotify rejects playlist item writes with more than this many URIs.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

impl SpotifyClient {
    /// Replaces every item of a playlist with the given tracks.
    ///
    /// Calling this with no track IDs empties the playlist in a single
    /// request. Returns the new snapshot ID.
    pub async fn replace_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<String, MatchError> {
        let body = PlaylistTracksRequest {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
        };
        let url = self.url(&format!("playlists/{playlist_id}/tracks"));

        let response = send(self.authorized(self.http.put(url).json(&body))).await?;
        snapshot(response).await
    }

    /// Appends tracks to the end of a playlist. Returns the new snapshot ID.
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<String, MatchError> {
        let body = PlaylistTracksRequest {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
        };
        let url = self.url(&format!("playlists/{playlist_id}/tracks"));

        let response = send(self.authorized(self.http.post(url).json(&body))).await?;
        snapshot(response).await
    }
}

async fn snapshot(response: reqwest::Response) -> Result<String, MatchError> {
    response
        .json::<PlaylistSnapshotResponse>()
        .await
        .map(|r| r.snapshot_id)
        .map_err(MatchError::Parse)
}
