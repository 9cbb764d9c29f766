//! Last.fm top-tracks adapter.
//!
//! Wraps the unsigned `user.gettoptracks` method. The JSON API reports
//! failures as `{"error": <code>, "message": <text>}`, sometimes with a 200
//! status, so the body is checked for that shape before anything else.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::{
    config::LastFmConfig,
    error::SourceFetchError,
    types::{LastFmErrorResponse, LastFmTopTracksResponse, LastFmTrack, TopTracksResult, TrackQuery},
};

/// A ranked list of a user's most played tracks.
pub trait TopTracksSource {
    /// Returns at most `n` tracks, most played first.
    fn fetch_top_tracks(
        &self,
        username: &str,
        n: u32,
    ) -> impl Future<Output = Result<TopTracksResult, SourceFetchError>> + Send;
}

/// Last.fm API client for a single API key.
#[derive(Debug, Clone)]
pub struct LastFmClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl LastFmClient {
    /// Creates a client that sends its requests to `config.api_url`.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client; its timeout applies to every request
    /// * `config` - Last.fm settings; only the API key and URL are used
    pub fn new(http: Client, config: &LastFmConfig) -> Self {
        Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl TopTracksSource for LastFmClient {
    async fn fetch_top_tracks(
        &self,
        username: &str,
        n: u32,
    ) -> Result<TopTracksResult, SourceFetchError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let limit = n.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("method", "user.gettoptracks"),
                ("user", username),
                ("limit", limit.as_str()),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(SourceFetchError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(SourceFetchError::Request)?;

        parse_top_tracks(status, &body, n)
    }
}

/// Turns a `user.gettoptracks` response into at most `n` queries.
///
/// Source order is kept. Rows without a track or artist name are dropped
/// since there is nothing to search for.
///
/// # Arguments
///
/// * `status` - HTTP status of the response
/// * `body` - Raw response body
/// * `n` - Maximum number of tracks to return
///
/// # Errors
///
/// - [`SourceFetchError::Api`] when the body is a Last.fm error object,
///   whatever the status
/// - [`SourceFetchError::Status`] for other non-success responses
/// - [`SourceFetchError::Parse`] when the body is not a top-tracks document
pub fn parse_top_tracks(
    status: reqwest::StatusCode,
    body: &str,
    n: u32,
) -> Result<TopTracksResult, SourceFetchError> {
    if let Ok(err) = serde_json::from_str::<LastFmErrorResponse>(body) {
        return Err(SourceFetchError::Api {
            code: err.error,
            message: err.message,
        });
    }

    if !status.is_success() {
        return Err(SourceFetchError::Status(status));
    }

    let parsed: LastFmTopTracksResponse =
        serde_json::from_str(body).map_err(|e| SourceFetchError::Parse(e.to_string()))?;

    Ok(parsed
        .toptracks
        .track
        .into_iter()
        .filter_map(|LastFmTrack { name, artist, .. }| {
            let (name, artist) = (name.trim().to_string(), artist.name.trim().to_string());
            (!name.is_empty() && !artist.is_empty()).then(|| TrackQuery::new(name, artist))
        })
        .take(n as usize)
        .collect())
}

/// Last.fm collapses single-element lists into a bare object.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}
