use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::Config,
    error, info, success,
    sync,
    types::{MatchReport, MatchTableRow, SkippedTableRow},
    utils, warning,
};

pub async fn sync(limit: Option<u32>, dry_run: bool) {
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration: {}", e),
    };
    if let Some(limit) = limit {
        config.top_tracks_limit = limit;
    }

    let http = match utils::http_client(config.request_timeout) {
        Ok(http) => http,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    };

    let pb = spinner(if dry_run {
        "Matching top tracks..."
    } else {
        "Syncing playlist..."
    });

    if dry_run {
        let result = sync::preview_with_config(&config, &http).await;
        pb.finish_and_clear();
        match result {
            Ok(report) => {
                print_matches(&report);
                print_skipped(&report);
                success!(
                    "{} tracks would be written to playlist {}",
                    report.matched.len(),
                    config.playlist_id
                );
            }
            Err(e) => error!("Dry run failed: {}", e),
        }
        return;
    }

    let result = sync::run_with_config(&config, &http).await;
    pb.finish_and_clear();
    match result {
        Ok(report) => {
            print_skipped(&report.matches);
            success!("Playlist updated successfully ({} tracks)", report.written);
        }
        Err(e) => error!("Error updating Spotify playlist: {}", e),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn print_matches(report: &MatchReport) {
    let rows: Vec<MatchTableRow> = report
        .matched
        .iter()
        .enumerate()
        .map(|(i, t)| MatchTableRow {
            rank: i + 1,
            track: utils::truncate(&t.name, 48),
            artist: utils::truncate(&t.artist, 32),
            spotify_id: t.id.clone(),
        })
        .collect();

    if rows.is_empty() {
        info!("No tracks matched");
        return;
    }
    println!("{}", Table::new(rows));
}

fn print_skipped(report: &MatchReport) {
    let rows: Vec<SkippedTableRow> = report
        .not_found
        .iter()
        .map(|q| SkippedTableRow {
            track: utils::truncate(&q.name, 48),
            artist: utils::truncate(&q.artist, 32),
            reason: "not found".to_string(),
        })
        .chain(report.skipped.iter().map(|s| SkippedTableRow {
            track: utils::truncate(&s.query.name, 48),
            artist: utils::truncate(&s.query.artist, 32),
            reason: utils::truncate(&s.error.to_string(), 60),
        }))
        .collect();

    if rows.is_empty() {
        return;
    }
    warning!("{} tracks were left out", rows.len());
    println!("{}", Table::new(rows));
}
