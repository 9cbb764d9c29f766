//! # Spotify Integration Module
//!
//! Thin client for the handful of Spotify Web API endpoints a sync run needs,
//! plus the OAuth 2.0 pieces used to obtain credentials.
//!
//! ```text
//! sync procedure
//!      ↓
//! PlaylistApi (trait)  ←  SpotifyClient (reqwest)
//!      ↓
//! Spotify Web API
//! ```
//!
//! - [`auth`] - authorization-code flow, refresh-token exchange, [`auth::TokenSource`]
//! - [`search`] - `GET /search` restricted to tracks
//! - [`playlist`] - `PUT`/`POST /playlists/{id}/tracks`
//!
//! ## Rate limiting
//!
//! A `429 Too Many Requests` answer is retried after the delay given in the
//! `Retry-After` header, up to [`MAX_RATE_LIMIT_RETRIES`] times and only when
//! the delay is at most [`MAX_RETRY_AFTER_SECS`]. Without the header the wait
//! is [`DEFAULT_RETRY_AFTER_SECS`]. Anything else is handed to the caller as a
//! [`MatchError`].

use std::{future::Future, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

use crate::{
    error::MatchError,
    types::{MatchedTrack, Token},
    warning,
};

pub mod auth;
pub mod playlist;
pub mod search;

pub const MAX_RETRY_AFTER_SECS: u64 = 120;
/// Delay used when a `429` carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
pub const MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// The music-platform operations a sync run is written against.
pub trait PlaylistApi {
    /// Runs a track search and returns the first hit, if any.
    fn search_track(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<MatchedTrack>, MatchError>> + Send;

    /// Replaces the whole playlist with `track_ids`. An empty slice clears it.
    fn replace_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> impl Future<Output = Result<(), MatchError>> + Send;

    /// Appends `track_ids` (at most 100) to the end of the playlist.
    fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> impl Future<Output = Result<(), MatchError>> + Send;
}

impl<T: PlaylistApi + Sync> PlaylistApi for &T {
    async fn search_track(&self, query: &str) -> Result<Option<MatchedTrack>, MatchError> {
        (**self).search_track(query).await
    }

    async fn replace_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        (**self).replace_tracks(playlist_id, track_ids).await
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        (**self).add_tracks(playlist_id, track_ids).await
    }
}

/// Spotify Web API client bound to one access token.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
}

impl SpotifyClient {
    /// Creates a client that authorizes every request with `token`.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `api_url` - Web API base URL, e.g. `https://api.spotify.com/v1`; a
    ///   trailing slash is ignored
    /// * `token` - Credential whose access token is sent as `Bearer`
    pub fn new(http: Client, api_url: impl Into<String>, token: &Token) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: token.access_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }
}

impl PlaylistApi for SpotifyClient {
    async fn search_track(&self, query: &str) -> Result<Option<MatchedTrack>, MatchError> {
        let tracks = self.search_tracks(query, 1).await?;

        Ok(tracks.into_iter().next().and_then(|track| {
            let id = track.id?;
            Some(MatchedTrack {
                id,
                artist: track
                    .artists
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                name: track.name,
            })
        }))
    }

    async fn replace_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        self.replace_playlist_tracks(playlist_id, track_ids)
            .await
            .map(|_| ())
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        self.add_tracks_to_playlist(playlist_id, track_ids)
            .await
            .map(|_| ())
    }
}

/// Sends `request`, sleeping through `429` answers as described in the module
/// docs, and turns non-success statuses into [`MatchError::Status`].
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, MatchError> {
    let mut retries = 0;

    loop {
        let Some(attempt) = request.try_clone() else {
            let response = request.send().await.map_err(MatchError::Request)?;
            return check_status(response).await;
        };

        let response = attempt.send().await.map_err(MatchError::Request)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RATE_LIMIT_RETRIES {
            let retry_after =
                retry_after_secs(&response).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            if retry_after <= MAX_RETRY_AFTER_SECS {
                warning!("Rate limited by Spotify, retrying in {} seconds", retry_after);
                sleep(Duration::from_secs(retry_after)).await;
                retries += 1;
                continue;
            }

            warning!(
                "Retry after has reached an abnormal high of {} seconds, giving up",
                retry_after
            );
        }

        return check_status(response).await;
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

async fn check_status(response: Response) -> Result<Response, MatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MatchError::Status {
        status,
        reason: error_message(&body),
    })
}

// Spotify errors look like {"error":{"status":400,"message":"..."}}.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .or(error.get("error_description"))
                .and_then(|m| m.as_str())
                .or(error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
