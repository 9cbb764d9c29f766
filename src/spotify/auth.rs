use std::{future::Future, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::time::timeout;

use crate::{
    config::SpotifyAppConfig,
    error::{ConfigError, TokenError},
    info,
    server::{self, AuthSession},
    types::{Token, TokenResponse},
    utils, warning,
};

/// Something that can hand out a valid Spotify bearer credential.
pub trait TokenSource {
    fn access_token(&self) -> impl Future<Output = Result<Token, TokenError>> + Send;
}

/// Non-interactive token source: trades a stored refresh token for a fresh
/// access token on every call.
#[derive(Debug, Clone)]
pub struct RefreshTokenProvider {
    http: Client,
    app: SpotifyAppConfig,
    refresh_token: String,
}

impl RefreshTokenProvider {
    pub fn new(http: Client, app: SpotifyAppConfig, refresh_token: impl Into<String>) -> Self {
        Self {
            http,
            app,
            refresh_token: refresh_token.into(),
        }
    }
}

impl TokenSource for RefreshTokenProvider {
    async fn access_token(&self) -> Result<Token, TokenError> {
        refresh_access_token(&self.http, &self.app, &self.refresh_token).await
    }
}

/// Builds the URL the user has to visit to grant access.
///
/// The request carries the configured scope, the opaque `state` that the
/// callback must echo back, and a PKCE S256 challenge derived from the code
/// verifier kept by the caller.
pub fn authorize_url(
    app: &SpotifyAppConfig,
    state: &str,
    code_challenge: &str,
) -> Result<String, ConfigError> {
    let url = Url::parse_with_params(
        &app.auth_url,
        &[
            ("client_id", app.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("scope", app.scope.as_str()),
            ("state", state),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
        ],
    )
    .map_err(|_| ConfigError::Invalid {
        name: "SPOTIFY_API_AUTH_URL",
        value: app.auth_url.clone(),
    })?;

    Ok(url.to_string())
}

/// Exchanges an authorization code (plus the PKCE verifier that goes with it)
/// for an access/refresh token pair.
pub async fn exchange_code(
    http: &Client,
    app: &SpotifyAppConfig,
    code: &str,
    code_verifier: &str,
) -> Result<Token, TokenError> {
    let response = request_token(
        http,
        app,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ],
    )
    .await?;

    Ok(into_token(response, ""))
}

/// Trades a refresh token for a new access token.
///
/// Spotify may or may not rotate the refresh token; when the response omits
/// it the one passed in is kept.
pub async fn refresh_access_token(
    http: &Client,
    app: &SpotifyAppConfig,
    refresh_token: &str,
) -> Result<Token, TokenError> {
    let response = request_token(
        http,
        app,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await?;

    Ok(into_token(response, refresh_token))
}

async fn request_token(
    http: &Client,
    app: &SpotifyAppConfig,
    form: &[(&str, &str)],
) -> Result<TokenResponse, TokenError> {
    let response = http
        .post(&app.token_url)
        .basic_auth(&app.client_id, Some(&app.client_secret))
        .form(form)
        .send()
        .await
        .map_err(TokenError::Request)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TokenError::Rejected {
            status,
            reason: token_error_reason(&body),
        });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(TokenError::Parse)
}

// {"error":"invalid_grant","error_description":"Invalid refresh token"}
fn token_error_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error_description")
                .or(json.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn into_token(response: TokenResponse, previous_refresh_token: &str) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .unwrap_or_else(|| previous_refresh_token.to_string()),
        scope: response.scope.unwrap_or_default(),
        expires_in: response.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    }
}

/// Runs the interactive authorization-code flow.
///
/// 1. Generates the `state` value and a PKCE verifier/challenge pair
/// 2. Starts the local callback server on `server_address`
/// 3. Opens the authorize URL in the default browser
/// 4. Waits for the callback to hand over the exchanged token
///
/// The callback delivers its result through a one-shot channel, so exactly
/// one token is accepted per process. Waiting stops after `wait`.
pub async fn auth(
    app: SpotifyAppConfig,
    http: Client,
    server_address: &str,
    wait: Duration,
) -> crate::Res<Token> {
    let state = utils::generate_state();
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let auth_url = authorize_url(&app, &state, &code_challenge)?;

    let (session, receiver) = AuthSession::new(app, http, state, code_verifier, auth_url.clone());

    let listener = server::bind(server_address).await?;
    info!(
        "Waiting for the Spotify callback on http://{}",
        listener.local_addr()?
    );
    let server = tokio::spawn(server::serve(listener, server::auth_router(session)));

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
    }

    let outcome = match timeout(wait, receiver).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(TokenError::Abandoned),
        Err(_) => Err(TokenError::Timeout(wait.as_secs())),
    };

    server.abort();
    Ok(outcome?)
}
