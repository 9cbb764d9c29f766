use crate::{
    error::MatchError,
    spotify::{SpotifyClient, send},
    types::{SearchResponse, Track},
};

impl SpotifyClient {
    /// Searches the Spotify catalog for tracks.
    ///
    /// `query` is passed through verbatim, so field filters such as
    /// `track:Song artist:Band` are honoured. Results come back in Spotify's
    /// relevance order with `null` placeholders removed; an empty vector
    /// means nothing matched.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses (after rate-limit retries)
    /// and undecodable bodies are returned as [`MatchError`].
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, MatchError> {
        let limit = limit.to_string();
        let request = self.authorized(self.http.get(self.url("search")).query(&[
            ("q", query),
            ("type", "track"),
            ("limit", limit.as_str()),
        ]));

        let response = send(request).await?;
        let json = response
            .json::<SearchResponse>()
            .await
            .map_err(MatchError::Parse)?;

        Ok(json.tracks.items.into_iter().flatten().collect())
    }
}
