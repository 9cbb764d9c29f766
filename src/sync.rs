//! Playlist synchronization.
//!
//! One run goes through these stages, strictly in order and without retries:
//!
//! ```text
//! Idle → Fetching → Matching → Clearing → Appending(batch i) → Done
//!                                                            ↘ Failed
//! ```
//!
//! Matching is best-effort: tracks Spotify cannot find, and tracks whose
//! search call fails, are left out and reported in the [`MatchReport`]. Every
//! other failure ends the run. A failed append leaves the playlist holding the
//! batches written before it; nothing is rolled back.

use std::fmt;

use reqwest::Client;

use crate::{
    config::Config,
    error::SyncError,
    info,
    lastfm::{LastFmClient, TopTracksSource},
    spotify::{
        PlaylistApi, SpotifyClient,
        auth::{RefreshTokenProvider, TokenSource},
        playlist::MAX_TRACKS_PER_REQUEST,
    },
    success,
    types::{MatchReport, MatchedTrack, SkippedTrack, SyncReport, Token, TrackQuery},
    utils, warning,
};

/// Tracks per append request.
pub const BATCH_SIZE: usize = MAX_TRACKS_PER_REQUEST;

/// The state a sync run is in. Logged on every transition.
///
/// `Appending` carries the 1-based batch being written and the total number
/// of batches, so a failure in the middle of the append phase is easy to
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Idle,
    Fetching,
    Matching,
    Clearing,
    Appending { batch: usize, batches: usize },
    Done,
    Failed,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Idle => write!(f, "idle"),
            SyncStage::Fetching => write!(f, "fetching"),
            SyncStage::Matching => write!(f, "matching"),
            SyncStage::Clearing => write!(f, "clearing"),
            SyncStage::Appending { batch, batches } => {
                write!(f, "appending batch {batch}/{batches}")
            }
            SyncStage::Done => write!(f, "done"),
            SyncStage::Failed => write!(f, "failed"),
        }
    }
}

/// What a run fetches and where it writes.
#[derive(Debug, Clone)]
pub struct SyncParams {
    /// Last.fm user whose top tracks are synced.
    pub username: String,
    /// Number of top tracks to request (N).
    pub limit: u32,
    /// Spotify playlist that gets overwritten.
    pub playlist_id: String,
}

impl SyncParams {
    /// Takes the username, limit and playlist from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            username: config.lastfm.username.clone(),
            limit: config.top_tracks_limit,
            playlist_id: config.playlist_id.clone(),
        }
    }
}

/// Builds the Spotify search query for a track.
///
/// Uses the `track:` and `artist:` field filters so the artist name narrows
/// the result instead of competing with the title.
///
/// # Example
///
/// ```
/// use topsync::{sync::search_expression, types::TrackQuery};
///
/// let query = TrackQuery::new("Hey Jude", "The Beatles");
/// assert_eq!(search_expression(&query), "track:Hey Jude artist:The Beatles");
/// ```
pub fn search_expression(query: &TrackQuery) -> String {
    format!("track:{} artist:{}", query.name, query.artist)
}

/// Looks up one track. The first search hit wins; `Ok(None)` means Spotify
/// returned nothing.
pub async fn match_track<A: PlaylistApi>(
    api: &A,
    query: &TrackQuery,
) -> Result<Option<MatchedTrack>, crate::error::MatchError> {
    api.search_track(&search_expression(query)).await
}

/// Matches every query in order, one request at a time.
///
/// Never fails: misses go to `not_found`, failed lookups to `skipped`.
///
/// # Arguments
///
/// * `api` - Playlist API used for the searches
/// * `queries` - Tracks to look up, in the order they should end up in the playlist
///
/// # Returns
///
/// A [`MatchReport`] whose `matched` list keeps the order of `queries`.
pub async fn match_tracks<A: PlaylistApi>(api: &A, queries: &[TrackQuery]) -> MatchReport {
    let mut report = MatchReport::default();

    for query in queries {
        match match_track(api, query).await {
            Ok(Some(track)) => report.matched.push(track),
            Ok(None) => {
                info!("Track '{}' by '{}' not found on Spotify", query.name, query.artist);
                report.not_found.push(query.clone());
            }
            Err(error) => {
                warning!(
                    "Error searching for track '{}' by '{}' on Spotify: {}",
                    query.name,
                    query.artist,
                    error
                );
                report.skipped.push(SkippedTrack {
                    query: query.clone(),
                    error,
                });
            }
        }
    }

    report
}

/// Empties the playlist, then appends `track_ids` in [`BATCH_SIZE`] chunks.
///
/// Returns the number of tracks written. Stops at the first rejected batch;
/// earlier batches stay in the playlist.
///
/// # Errors
///
/// - [`SyncError::ClearFailed`] if emptying the playlist is rejected. Nothing
///   is appended in that case.
/// - [`SyncError::AppendFailed`] with the failing batch number and the count
///   of tracks already written.
pub async fn replace_playlist<A: PlaylistApi>(
    api: &A,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<usize, SyncError> {
    info!("Stage: {}", SyncStage::Clearing);
    api.replace_tracks(playlist_id, &[])
        .await
        .map_err(SyncError::ClearFailed)?;

    let batches = utils::batch_count(track_ids.len(), BATCH_SIZE);
    let mut written = 0;

    for (index, chunk) in track_ids.chunks(BATCH_SIZE).enumerate() {
        let batch = index + 1;
        info!("Stage: {}", SyncStage::Appending { batch, batches });

        if let Err(source) = api.add_tracks(playlist_id, chunk).await {
            return Err(SyncError::AppendFailed {
                batch,
                batches,
                written,
                source,
            });
        }
        written += chunk.len();
    }

    Ok(written)
}

/// Matches `top_tracks` and overwrites the playlist with the hits, in order.
pub async fn sync_playlist<A: PlaylistApi>(
    api: &A,
    playlist_id: &str,
    top_tracks: &[TrackQuery],
) -> Result<SyncReport, SyncError> {
    info!("Stage: {}", SyncStage::Matching);
    let matches = match_tracks(api, top_tracks).await;
    info!(
        "Matched {} of {} tracks ({} not found, {} skipped)",
        matches.matched.len(),
        top_tracks.len(),
        matches.not_found.len(),
        matches.skipped.len()
    );

    let written = replace_playlist(api, playlist_id, &matches.track_ids()).await?;

    Ok(SyncReport { written, matches })
}

/// Drives one full run: token, fetch, match, clear, append.
///
/// # Arguments
///
/// * `tokens` - Source of the Spotify bearer credential, asked once per run
/// * `source` - Top-tracks source queried with `params.username` and `params.limit`
/// * `connect` - Builds the playlist client from the freshly obtained token
/// * `params` - User, limit and target playlist
///
/// # Returns
///
/// A [`SyncReport`] on success. On failure the [`SyncError`] names the stage
/// that failed; a token or fetch failure leaves the playlist untouched.
pub async fn run<T, S, A, F>(
    tokens: &T,
    source: &S,
    connect: F,
    params: &SyncParams,
) -> Result<SyncReport, SyncError>
where
    T: TokenSource,
    S: TopTracksSource,
    A: PlaylistApi,
    F: FnOnce(&Token) -> A,
{
    let result = async {
        let (api, top_tracks) = prepare(tokens, source, connect, params).await?;
        sync_playlist(&api, &params.playlist_id, &top_tracks).await
    }
    .await;

    log_outcome(&result);
    result
}

/// Like [`run`] but stops after matching; the playlist is not touched.
pub async fn preview<T, S, A, F>(
    tokens: &T,
    source: &S,
    connect: F,
    params: &SyncParams,
) -> Result<MatchReport, SyncError>
where
    T: TokenSource,
    S: TopTracksSource,
    A: PlaylistApi,
    F: FnOnce(&Token) -> A,
{
    let (api, top_tracks) = prepare(tokens, source, connect, params).await?;
    info!("Stage: {}", SyncStage::Matching);
    Ok(match_tracks(&api, &top_tracks).await)
}

async fn prepare<T, S, A, F>(
    tokens: &T,
    source: &S,
    connect: F,
    params: &SyncParams,
) -> Result<(A, Vec<TrackQuery>), SyncError>
where
    T: TokenSource,
    S: TopTracksSource,
    A: PlaylistApi,
    F: FnOnce(&Token) -> A,
{
    info!("Stage: {}", SyncStage::Idle);
    let token = tokens.access_token().await?;
    let api = connect(&token);

    info!("Stage: {}", SyncStage::Fetching);
    let top_tracks = source
        .fetch_top_tracks(&params.username, params.limit)
        .await?;
    info!(
        "Fetched {} top tracks for {}",
        top_tracks.len(),
        params.username
    );

    Ok((api, top_tracks))
}

fn log_outcome(result: &Result<SyncReport, SyncError>) {
    match result {
        Ok(report) => {
            info!("Stage: {}", SyncStage::Done);
            success!("Playlist updated with {} tracks", report.written);
        }
        Err(e) => {
            info!("Stage: {}", SyncStage::Failed);
            warning!("Sync failed at {}: {}", e.stage(), e);
        }
    }
}

/// [`run`] wired to the real Last.fm and Spotify clients.
pub async fn run_with_config(config: &Config, http: &Client) -> Result<SyncReport, SyncError> {
    let (tokens, source) = clients(config, http);
    run(
        &tokens,
        &source,
        |token| SpotifyClient::new(http.clone(), &config.spotify.api_url, token),
        &SyncParams::from_config(config),
    )
    .await
}

/// [`preview`] wired to the real Last.fm and Spotify clients.
pub async fn preview_with_config(config: &Config, http: &Client) -> Result<MatchReport, SyncError> {
    let (tokens, source) = clients(config, http);
    preview(
        &tokens,
        &source,
        |token| SpotifyClient::new(http.clone(), &config.spotify.api_url, token),
        &SyncParams::from_config(config),
    )
    .await
}

fn clients(config: &Config, http: &Client) -> (RefreshTokenProvider, LastFmClient) {
    (
        RefreshTokenProvider::new(
            http.clone(),
            config.spotify.clone(),
            config.refresh_token.clone(),
        ),
        LastFmClient::new(http.clone(), &config.lastfm),
    )
}
