use std::{collections::HashMap, time::Duration};

use topsync::{
    config::{self, Config, SpotifyAppConfig},
    error::ConfigError,
};

fn complete() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("SPOTIFY_CLIENT_ID", "client"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
        ("SPOTIFY_REFRESH_TOKEN", "refresh"),
        ("SPOTIFY_PLAYLIST_ID", "playlist"),
        ("LASTFM_API_KEY", "key"),
        ("LASTFM_USERNAME", "listener"),
    ])
}

fn lookup<'a>(vars: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> + 'a {
    move |name| vars.get(name).map(|v| v.to_string())
}

#[test]
fn test_defaults_fill_optional_settings() {
    let vars = complete();
    let config = Config::from_lookup(lookup(&vars)).unwrap();

    assert_eq!(config.spotify.client_id, "client");
    assert_eq!(config.spotify.redirect_uri, config::DEFAULT_REDIRECT_URI);
    assert_eq!(config.spotify.scope, config::DEFAULT_SCOPE);
    assert_eq!(config.spotify.api_url, "https://api.spotify.com/v1");
    assert_eq!(config.lastfm.api_url, config::DEFAULT_LASTFM_API_URL);
    assert_eq!(config.top_tracks_limit, 200);
    assert_eq!(config.server_address, "127.0.0.1:8080");
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.auth_timeout, Duration::from_secs(300));
}

#[test]
fn test_overrides_are_applied() {
    let mut vars = complete();
    vars.insert("TOP_TRACKS_LIMIT", "50");
    vars.insert("SERVER_ADDRESS", "0.0.0.0:9000");
    vars.insert("SPOTIFY_API_URL", "http://localhost:1234/v1/");
    vars.insert("REQUEST_TIMEOUT_SECS", " 5 ");

    let config = Config::from_lookup(lookup(&vars)).unwrap();

    assert_eq!(config.top_tracks_limit, 50);
    assert_eq!(config.server_address, "0.0.0.0:9000");
    assert_eq!(config.spotify.api_url, "http://localhost:1234/v1");
    assert_eq!(config.request_timeout, Duration::from_secs(5));
}

#[test]
fn test_missing_required_variable_is_named() {
    for name in [
        "SPOTIFY_CLIENT_ID",
        "SPOTIFY_CLIENT_SECRET",
        "SPOTIFY_REFRESH_TOKEN",
        "SPOTIFY_PLAYLIST_ID",
        "LASTFM_API_KEY",
        "LASTFM_USERNAME",
    ] {
        let mut vars = complete();
        vars.remove(name);

        match Config::from_lookup(lookup(&vars)) {
            Err(ConfigError::Missing(missing)) => assert_eq!(missing, name),
            other => panic!("expected {name} to be missing, got {other:?}"),
        }
    }
}

#[test]
fn test_invalid_number_is_rejected() {
    let mut vars = complete();
    vars.insert("TOP_TRACKS_LIMIT", "lots");

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "TOP_TRACKS_LIMIT",
            ..
        }
    ));
}

#[test]
fn test_zero_limit_is_rejected() {
    let mut vars = complete();
    vars.insert("TOP_TRACKS_LIMIT", "0");

    assert!(matches!(
        Config::from_lookup(lookup(&vars)),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn test_auth_settings_need_only_client_credentials() {
    let vars = HashMap::from([
        ("SPOTIFY_CLIENT_ID", "client"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
    ]);

    let app = SpotifyAppConfig::from_lookup(lookup(&vars)).unwrap();

    assert_eq!(app.client_secret, "secret");
    assert_eq!(app.token_url, config::DEFAULT_TOKEN_URL);
    assert_eq!(app.auth_url, config::DEFAULT_AUTH_URL);
}

#[test]
fn test_lastfm_secret_is_not_required() {
    let mut vars = complete();
    vars.insert("LASTFM_API_SECRET", "secret");
    let with_secret = Config::from_lookup(lookup(&vars)).unwrap();
    vars.remove("LASTFM_API_SECRET");
    let without_secret = Config::from_lookup(lookup(&vars)).unwrap();

    assert_eq!(with_secret.lastfm.api_key, without_secret.lastfm.api_key);
    assert_eq!(without_secret.lastfm.api_url, config::DEFAULT_LASTFM_API_URL);
}
