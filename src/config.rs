//! Configuration management for topsync.
//!
//! All settings come from environment variables, optionally seeded from a
//! `.env` file. They are read once at startup into a [`Config`] value that is
//! handed by reference to the components that need it; nothing in the crate
//! reads the environment after that point.
//!
//! Lookup order for the `.env` file:
//! 1. `./.env` in the working directory
//! 2. `.env` in the local data directory (`~/.local/share/topsync/.env` on Linux)
//!
//! Variables already present in the process environment always win.

use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_SCOPE: &str = "playlist-modify-public playlist-modify-private playlist-read-private";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_TOP_TRACKS_LIMIT: u32 = 200;
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

/// Loads environment variables from a `.env` file.
///
/// A `.env` in the working directory takes precedence over the one in the
/// local data directory. The data directory is created if it does not exist
/// so users have an obvious place to drop the file. A missing `.env` file is
/// not an error; a malformed one is.
///
/// # Example
///
/// ```
/// use topsync::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<(), ConfigError> {
    let local = PathBuf::from(".env");
    if local.is_file() {
        dotenv::from_path(&local).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        return Ok(());
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("topsync/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::EnvFile(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
    }

    Ok(())
}

/// Reads a variable from the process environment.
///
/// Empty values are treated as unset so a half-filled `.env.example` copy
/// reports the missing variables by name.
pub fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Spotify application settings: the client credentials and the endpoints
/// they are used against.
///
/// This is all the interactive `auth` command needs.
#[derive(Debug, Clone)]
pub struct SpotifyAppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl SpotifyAppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            client_id: required(&lookup, "SPOTIFY_CLIENT_ID")?,
            client_secret: required(&lookup, "SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: or_default(&lookup, "SPOTIFY_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scope: or_default(&lookup, "SPOTIFY_SCOPE", DEFAULT_SCOPE),
            auth_url: or_default(&lookup, "SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or_default(&lookup, "SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: trim_slash(or_default(&lookup, "SPOTIFY_API_URL", DEFAULT_API_URL)),
        })
    }
}

/// Last.fm account and API settings.
///
/// `user.gettoptracks` is an unsigned method, so only the API key is read;
/// `LASTFM_API_SECRET` is accepted in `.env` files but ignored.
#[derive(Debug, Clone)]
pub struct LastFmConfig {
    pub api_key: String,
    pub username: String,
    pub api_url: String,
}

impl LastFmConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(&lookup, "LASTFM_API_KEY")?,
            username: required(&lookup, "LASTFM_USERNAME")?,
            api_url: or_default(&lookup, "LASTFM_API_URL", DEFAULT_LASTFM_API_URL),
        })
    }
}

/// Everything a sync run (and the HTTP trigger service) needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyAppConfig,
    pub lastfm: LastFmConfig,
    pub refresh_token: String,
    pub playlist_id: String,
    pub top_tracks_limit: u32,
    pub server_address: String,
    pub request_timeout: Duration,
    pub auth_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Tests pass a map-backed closure here instead of touching the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let top_tracks_limit = parsed(&lookup, "TOP_TRACKS_LIMIT", DEFAULT_TOP_TRACKS_LIMIT)?;
        if top_tracks_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "TOP_TRACKS_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            spotify: SpotifyAppConfig::from_lookup(&lookup)?,
            lastfm: LastFmConfig::from_lookup(&lookup)?,
            refresh_token: required(&lookup, "SPOTIFY_REFRESH_TOKEN")?,
            playlist_id: required(&lookup, "SPOTIFY_PLAYLIST_ID")?,
            top_tracks_limit,
            server_address: server_address_from(&lookup),
            request_timeout: request_timeout_from(&lookup)?,
            auth_timeout: auth_timeout_from(&lookup)?,
        })
    }
}

pub fn server_address_from<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    or_default(lookup, "SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

pub fn request_timeout_from<F>(lookup: &F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(Duration::from_secs(parsed(
        lookup,
        "REQUEST_TIMEOUT_SECS",
        DEFAULT_REQUEST_TIMEOUT_SECS,
    )?))
}

pub fn auth_timeout_from<F>(lookup: &F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(Duration::from_secs(parsed(
        lookup,
        "AUTH_TIMEOUT_SECS",
        DEFAULT_AUTH_TIMEOUT_SECS,
    )?))
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or(ConfigError::Missing(name))
}

fn or_default<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
