mod common;

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use reqwest::StatusCode as Status;
use serde_json::{Value, json};
use topsync::{
    config::LastFmConfig,
    error::SourceFetchError,
    lastfm::{LastFmClient, TopTracksSource, parse_top_tracks},
    types::TrackQuery,
};

fn ranked(n: usize) -> Value {
    let tracks: Vec<Value> = (1..=n)
        .map(|rank| {
            json!({
                "name": format!("Song {rank}"),
                "playcount": format!("{}", 1000 - rank),
                "artist": { "name": format!("Artist {rank}"), "mbid": "" },
                "@attr": { "rank": format!("{rank}") }
            })
        })
        .collect();
    json!({ "toptracks": { "track": tracks, "@attr": { "user": "listener" } } })
}

fn lastfm_config(base: &str) -> LastFmConfig {
    LastFmConfig {
        api_key: "key".to_string(),
        username: "listener".to_string(),
        api_url: format!("{base}/2.0/"),
    }
}

#[test]
fn test_parse_keeps_source_order() {
    let body = ranked(3).to_string();
    let tracks = parse_top_tracks(Status::OK, &body, 10).unwrap();

    assert_eq!(
        tracks,
        vec![
            TrackQuery::new("Song 1", "Artist 1"),
            TrackQuery::new("Song 2", "Artist 2"),
            TrackQuery::new("Song 3", "Artist 3"),
        ]
    );
}

#[test]
fn test_parse_never_returns_more_than_requested() {
    let body = ranked(8).to_string();
    for n in 1..=10u32 {
        let tracks = parse_top_tracks(Status::OK, &body, n).unwrap();
        assert_eq!(tracks.len(), (n as usize).min(8));
    }
}

#[test]
fn test_parse_single_track_object() {
    let body = json!({ "toptracks": { "track": {
        "name": "Only", "artist": { "name": "One" }
    }}})
    .to_string();

    let tracks = parse_top_tracks(Status::OK, &body, 5).unwrap();
    assert_eq!(tracks, vec![TrackQuery::new("Only", "One")]);
}

#[test]
fn test_parse_drops_rows_without_names() {
    let body = json!({ "toptracks": { "track": [
        { "name": "  ", "artist": { "name": "Somebody" } },
        { "name": "Kept", "artist": { "name": "Band" } },
        { "name": "Orphan", "artist": { "name": "" } },
    ]}})
    .to_string();

    let tracks = parse_top_tracks(Status::OK, &body, 5).unwrap();
    assert_eq!(tracks, vec![TrackQuery::new("Kept", "Band")]);
}

#[test]
fn test_parse_user_without_tracks() {
    let body = json!({ "toptracks": { "track": [], "@attr": { "total": "0" } } }).to_string();
    assert!(parse_top_tracks(Status::OK, &body, 5).unwrap().is_empty());
}

#[test]
fn test_parse_api_error_body() {
    let body = json!({ "error": 6, "message": "User not found" }).to_string();

    match parse_top_tracks(Status::NOT_FOUND, &body, 5) {
        Err(SourceFetchError::Api { code, message }) => {
            assert_eq!(code, 6);
            assert_eq!(message, "User not found");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_parse_status_without_error_body() {
    let result = parse_top_tracks(Status::BAD_GATEWAY, "<html>bad gateway</html>", 5);
    assert!(matches!(
        result,
        Err(SourceFetchError::Status(Status::BAD_GATEWAY))
    ));
}

#[tokio::test]
async fn test_fetch_sends_method_user_and_limit() {
    let seen: Arc<std::sync::Mutex<Vec<HashMap<String, String>>>> = Arc::default();
    let recorder = seen.clone();
    let app = Router::new().route(
        "/2.0/",
        get(move |Query(q): Query<HashMap<String, String>>| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(q);
                // ignores the limit on purpose
                Json(ranked(5))
            }
        }),
    );
    let base = common::spawn(app).await;
    let client = LastFmClient::new(common::http(), &lastfm_config(&base));

    let tracks = client.fetch_top_tracks("listener", 3).await.unwrap();

    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0], TrackQuery::new("Song 1", "Artist 1"));
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["method"], "user.gettoptracks");
    assert_eq!(seen[0]["user"], "listener");
    assert_eq!(seen[0]["limit"], "3");
    assert_eq!(seen[0]["api_key"], "key");
    assert_eq!(seen[0]["format"], "json");
}

#[tokio::test]
async fn test_fetch_zero_makes_no_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/2.0/",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(ranked(5))
            }
        }),
    );
    let base = common::spawn(app).await;
    let client = LastFmClient::new(common::http(), &lastfm_config(&base));

    let tracks = client.fetch_top_tracks("listener", 0).await.unwrap();

    assert!(tracks.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_error_is_a_source_fetch_error() {
    let app = Router::new().route(
        "/2.0/",
        get(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": 10, "message": "Invalid API key" })),
            )
        }),
    );
    let base = common::spawn(app).await;
    let client = LastFmClient::new(common::http(), &lastfm_config(&base));

    let err = client.fetch_top_tracks("listener", 10).await.unwrap_err();
    assert!(matches!(err, SourceFetchError::Api { code: 10, .. }));
}
