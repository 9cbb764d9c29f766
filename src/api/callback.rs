use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode, response::Html};

use crate::{error::TokenError, server::AuthSession, spotify::auth::exchange_code, warning};

/// Completes the authorization-code flow.
///
/// The first callback carrying the expected `state` consumes the session:
/// its outcome, success or failure, is handed to the waiting `auth` command.
/// Later callbacks get `410 Gone`.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(session): Extension<Arc<AuthSession>>,
) -> (StatusCode, Html<&'static str>) {
    if params.get("state") != Some(&session.state) {
        warning!(
            "State mismatch: {} != {}",
            params.get("state").map(String::as_str).unwrap_or_default(),
            session.state
        );
        if let Some(sender) = session.take_sender().await {
            let _ = sender.send(Err(TokenError::StateMismatch));
        }
        return (StatusCode::FORBIDDEN, Html("<h4>State mismatch.</h4>"));
    }

    if let Some(reason) = params.get("error") {
        if let Some(sender) = session.take_sender().await {
            let _ = sender.send(Err(TokenError::Denied(reason.clone())));
        }
        return (StatusCode::BAD_REQUEST, Html("<h4>Authorization denied.</h4>"));
    }

    let Some(code) = params.get("code") else {
        return (StatusCode::BAD_REQUEST, Html("<h4>Missing authorization code.</h4>"));
    };

    let Some(sender) = session.take_sender().await else {
        return (StatusCode::GONE, Html("<h4>Authorization already completed.</h4>"));
    };

    match exchange_code(&session.http, &session.app, code, &session.code_verifier).await {
        Ok(token) => {
            let _ = sender.send(Ok(token));
            (
                StatusCode::OK,
                Html("<h2>Login Completed!</h2><p>You can close this window.</p>"),
            )
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            let _ = sender.send(Err(e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h4>Couldn't get token.</h4>"),
            )
        }
    }
}
