use crate::{config::Config, error, server, utils};

pub async fn serve() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration: {}", e),
    };
    let http = match utils::http_client(config.request_timeout) {
        Ok(http) => http,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    };

    if let Err(e) = server::start_sync_server(config, http).await {
        error!("Server stopped: {}", e);
    }
}
