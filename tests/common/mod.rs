#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::Router;
use reqwest::{Client, StatusCode};
use tokio::net::TcpListener;
use topsync::{
    error::{MatchError, SourceFetchError, TokenError},
    lastfm::TopTracksSource,
    spotify::{PlaylistApi, auth::TokenSource},
    sync::search_expression,
    types::{MatchedTrack, TopTracksResult, Token, TrackQuery},
    utils,
};

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn http() -> Client {
    utils::http_client(Duration::from_secs(5)).unwrap()
}

pub fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        scope: String::new(),
        expires_in: 3600,
        obtained_at: 0,
    }
}

pub fn queries(n: usize) -> Vec<TrackQuery> {
    (0..n)
        .map(|i| TrackQuery::new(format!("Song {i}"), format!("Artist {i}")))
        .collect()
}

fn rejected(reason: &str) -> MatchError {
    MatchError::Status {
        status: StatusCode::BAD_GATEWAY,
        reason: reason.to_string(),
    }
}

/// In-memory stand-in for the Spotify playlist endpoints.
#[derive(Default)]
pub struct FakeSpotify {
    catalog: HashMap<String, String>,
    failing_searches: HashSet<String>,
    pub fail_clear: bool,
    /// 1-based index of the append call that fails.
    pub fail_add_call: Option<usize>,
    state: Mutex<FakeState>,
}

#[derive(Default, Clone)]
pub struct FakeState {
    pub playlist: Vec<String>,
    pub searches: Vec<String>,
    pub replace_calls: Vec<usize>,
    pub add_calls: Vec<usize>,
}

impl FakeSpotify {
    pub fn with_playlist(ids: &[&str]) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().playlist = ids.iter().map(|s| s.to_string()).collect();
        fake
    }

    pub fn knows(mut self, query: &TrackQuery, id: &str) -> Self {
        self.catalog.insert(search_expression(query), id.to_string());
        self
    }

    /// Registers every query with the ID `id-<index>`.
    pub fn knows_all(mut self, queries: &[TrackQuery]) -> Self {
        for (i, q) in queries.iter().enumerate() {
            self.catalog.insert(search_expression(q), format!("id-{i}"));
        }
        self
    }

    pub fn fails_search(mut self, query: &TrackQuery) -> Self {
        self.failing_searches.insert(search_expression(query));
        self
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }
}

impl PlaylistApi for FakeSpotify {
    async fn search_track(&self, query: &str) -> Result<Option<MatchedTrack>, MatchError> {
        self.state.lock().unwrap().searches.push(query.to_string());
        if self.failing_searches.contains(query) {
            return Err(rejected("search unavailable"));
        }
        Ok(self.catalog.get(query).map(|id| MatchedTrack {
            id: id.clone(),
            name: query.to_string(),
            artist: String::new(),
        }))
    }

    async fn replace_tracks(&self, _playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        let mut state = self.state.lock().unwrap();
        state.replace_calls.push(track_ids.len());
        if self.fail_clear {
            return Err(rejected("clear rejected"));
        }
        state.playlist = track_ids.to_vec();
        Ok(())
    }

    async fn add_tracks(&self, _playlist_id: &str, track_ids: &[String]) -> Result<(), MatchError> {
        let mut state = self.state.lock().unwrap();
        state.add_calls.push(track_ids.len());
        if self.fail_add_call == Some(state.add_calls.len()) {
            return Err(rejected("append rejected"));
        }
        state.playlist.extend_from_slice(track_ids);
        Ok(())
    }
}

/// Fixture top-tracks source; honours the limit like the real adapter.
#[derive(Default)]
pub struct FakeSource {
    pub tracks: Vec<TrackQuery>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(tracks: Vec<TrackQuery>) -> Self {
        Self {
            tracks,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TopTracksSource for FakeSource {
    async fn fetch_top_tracks(&self, _username: &str, n: u32) -> Result<TopTracksResult, SourceFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceFetchError::Api {
                code: 6,
                message: "User not found".to_string(),
            });
        }
        Ok(self.tracks.iter().take(n as usize).cloned().collect())
    }
}

pub struct FakeTokens {
    pub fail: bool,
}

impl TokenSource for FakeTokens {
    async fn access_token(&self) -> Result<Token, TokenError> {
        if self.fail {
            return Err(TokenError::Rejected {
                status: StatusCode::BAD_REQUEST,
                reason: "Invalid refresh token".to_string(),
            });
        }
        Ok(token("fake-access"))
    }
}
