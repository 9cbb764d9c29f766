use std::sync::Arc;

use axum::{Extension, http::StatusCode};

use crate::server::SyncService;

/// Runs one sync pass and reports the outcome as plain text.
pub async fn trigger_sync(Extension(service): Extension<Arc<SyncService>>) -> (StatusCode, String) {
    match service.run_once().await {
        Ok(report) => (
            StatusCode::OK,
            format!("Playlist updated successfully ({} tracks)", report.written),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error updating Spotify playlist: {e}"),
        ),
    }
}
