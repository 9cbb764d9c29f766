use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::MatchError;

/// Spotify bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt((self.obtained_at + self.expires_in) as i64, 0)
            .single()
    }
}

/// Raw token endpoint payload. `refresh_token` and `scope` are optional on
/// refresh responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
}

/// A track to look up, as reported by the top-tracks source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub name: String,
    pub artist: String,
}

impl TrackQuery {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
        }
    }
}

/// Ordered by descending play count.
pub type TopTracksResult = Vec<TrackQuery>;

/// A Spotify track found for a [`TrackQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedTrack {
    /// Spotify track ID, without the `spotify:track:` prefix.
    pub id: String,
    pub name: String,
    pub artist: String,
}

/// Spotify URI for a track ID, as expected by the playlist endpoints.
pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

/// A track dropped from the run because its search call failed.
#[derive(Debug)]
pub struct SkippedTrack {
    pub query: TrackQuery,
    pub error: MatchError,
}

/// Outcome of the matching phase.
///
/// Every query ends up in exactly one of the three lists.
#[derive(Debug, Default)]
pub struct MatchReport {
    /// Hits, in source order.
    pub matched: Vec<MatchedTrack>,
    /// Queries the search answered with no results.
    pub not_found: Vec<TrackQuery>,
    /// Queries whose search call failed.
    pub skipped: Vec<SkippedTrack>,
}

impl MatchReport {
    /// IDs of the matched tracks, in playlist order.
    pub fn track_ids(&self) -> Vec<String> {
        self.matched.iter().map(|t| t.id.clone()).collect()
    }
}

/// Result of a completed sync run.
#[derive(Debug)]
pub struct SyncReport {
    /// Tracks now in the playlist.
    pub written: usize,
    pub matches: MatchReport,
}

#[derive(Tabled)]
pub struct MatchTableRow {
    pub rank: usize,
    pub track: String,
    pub artist: String,
    pub spotify_id: String,
}

#[derive(Tabled)]
pub struct SkippedTableRow {
    pub track: String,
    pub artist: String,
    pub reason: String,
}

// Last.fm user.gettoptracks

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmTopTracksResponse {
    pub toptracks: LastFmTopTracks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmTopTracks {
    #[serde(default, deserialize_with = "crate::lastfm::one_or_many")]
    pub track: Vec<LastFmTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmTrack {
    pub name: String,
    pub artist: LastFmArtist,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastFmErrorResponse {
    pub error: i64,
    pub message: String,
}

// Spotify Web API

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: SearchTracks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTracks {
    /// Spotify occasionally returns `null` in place of an item.
    pub items: Vec<Option<Track>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnapshotResponse {
    pub snapshot_id: String,
}
