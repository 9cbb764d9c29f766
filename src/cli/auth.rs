use crate::{config, error, info, spotify, success, utils};

pub async fn auth() {
    let app = match config::SpotifyAppConfig::from_env() {
        Ok(app) => app,
        Err(e) => error!("Cannot read Spotify settings: {}", e),
    };
    let server_address = config::server_address_from(&config::env_lookup);
    let wait = match config::auth_timeout_from(&config::env_lookup) {
        Ok(wait) => wait,
        Err(e) => error!("{}", e),
    };
    let request_timeout = match config::request_timeout_from(&config::env_lookup) {
        Ok(timeout) => timeout,
        Err(e) => error!("{}", e),
    };
    let http = match utils::http_client(request_timeout) {
        Ok(http) => http,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    };

    match spotify::auth::auth(app, http, &server_address, wait).await {
        Ok(token) => {
            success!("Authentication successful!");
            info!("Access Token: {}", token.access_token);
            info!("Refresh Token: {}", token.refresh_token);
            if let Some(expires_at) = token.expires_at() {
                info!("Access token expires at {}", expires_at.to_rfc3339());
            }
            info!("Store the refresh token as SPOTIFY_REFRESH_TOKEN to enable `topsync sync`.");
        }
        Err(e) => error!("Authentication failed: {}", e),
    }
}
