//! Error types for every stage of a sync run.
//!
//! Each component owns its own error enum. [`SyncError`] is what a whole run
//! fails with; its display string always starts with the name of the stage
//! that failed so the HTTP trigger and the CLI can show it as-is.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to load .env file: {0}")]
    EnvFile(String),
}

/// Failure to obtain a Spotify bearer credential.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to send token request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("token endpoint rejected the request ({status}): {reason}")]
    Rejected { status: StatusCode, reason: String },
    #[error("failed to parse token response: {0}")]
    Parse(#[source] reqwest::Error),
    #[error("authorization was denied: {0}")]
    Denied(String),
    #[error("authorization state mismatch")]
    StateMismatch,
    #[error("no authorization callback received within {0} seconds")]
    Timeout(u64),
    #[error("authorization callback channel closed")]
    Abandoned,
}

/// Failure of the top-tracks query.
#[derive(Debug, thiserror::Error)]
pub enum SourceFetchError {
    #[error("failed to send top tracks request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("top tracks request failed with status {0}")]
    Status(StatusCode),
    #[error("Last.fm error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("failed to parse top tracks response: {0}")]
    Parse(String),
}

/// Failure of a Spotify Web API call.
///
/// A search that returns no results is not a `MatchError`.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("request failed with status {status}: {reason}")]
    Status { status: StatusCode, reason: String },
    #[error("failed to parse response: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Why a sync run stopped.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("token: {0}")]
    Token(#[from] TokenError),
    #[error("fetch: {0}")]
    SourceFetch(#[from] SourceFetchError),
    #[error("clear-failed: failed to clear playlist: {0}")]
    ClearFailed(#[source] MatchError),
    #[error(
        "append-failed: batch {batch} of {batches} was rejected after {written} tracks were written: {source}"
    )]
    AppendFailed {
        batch: usize,
        batches: usize,
        written: usize,
        #[source]
        source: MatchError,
    },
}

impl SyncError {
    /// Short stage name, used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            SyncError::Token(_) => "token",
            SyncError::SourceFetch(_) => "fetch",
            SyncError::ClearFailed(_) => "clear-failed",
            SyncError::AppendFailed { .. } => "append-failed",
        }
    }
}
