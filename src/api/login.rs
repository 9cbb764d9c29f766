use std::sync::Arc;

use axum::{
    Extension,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::server::AuthSession;

/// Sends the browser to the Spotify consent page.
pub async fn login(Extension(session): Extension<Arc<AuthSession>>) -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, session.authorize_url.clone())],
    )
}
