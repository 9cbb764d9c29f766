use std::{io, sync::Arc};

use axum::{
    Extension, Router,
    routing::get,
};
use reqwest::Client;
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};

use crate::{
    api,
    config::{Config, SpotifyAppConfig},
    error::{SyncError, TokenError},
    sync,
    types::{SyncReport, Token},
};

pub type TokenSender = oneshot::Sender<Result<Token, TokenError>>;

/// State for one interactive authorization attempt.
///
/// The sender is taken on the first callback, so the waiting command receives
/// exactly one result per process.
pub struct AuthSession {
    pub app: SpotifyAppConfig,
    pub http: Client,
    pub state: String,
    pub code_verifier: String,
    pub authorize_url: String,
    sender: Mutex<Option<TokenSender>>,
}

impl AuthSession {
    pub fn new(
        app: SpotifyAppConfig,
        http: Client,
        state: String,
        code_verifier: String,
        authorize_url: String,
    ) -> (Arc<Self>, oneshot::Receiver<Result<Token, TokenError>>) {
        let (sender, receiver) = oneshot::channel();
        let session = Self {
            app,
            http,
            state,
            code_verifier,
            authorize_url,
            sender: Mutex::new(Some(sender)),
        };
        (Arc::new(session), receiver)
    }

    /// Takes the handoff sender. Returns `None` once the result was delivered.
    pub async fn take_sender(&self) -> Option<TokenSender> {
        self.sender.lock().await.take()
    }
}

/// Runs sync passes for the HTTP trigger, one at a time.
pub struct SyncService {
    pub config: Config,
    pub http: Client,
    running: Mutex<()>,
}

impl SyncService {
    pub fn new(config: Config, http: Client) -> Self {
        Self {
            config,
            http,
            running: Mutex::new(()),
        }
    }

    /// Runs one sync pass. A trigger that arrives while another pass is in
    /// flight waits for it to finish first.
    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.running.lock().await;
        sync::run_with_config(&self.config, &self.http).await
    }
}

pub fn auth_router(session: Arc<AuthSession>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .layer(Extension(session))
}

pub fn sync_router(service: Arc<SyncService>) -> Router {
    Router::new()
        .route("/", get(api::trigger_sync).post(api::trigger_sync))
        .route("/health", get(api::health))
        .layer(Extension(service))
}

pub async fn bind(addr: &str) -> io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

pub async fn serve(listener: TcpListener, app: Router) -> io::Result<()> {
    axum::serve(listener, app).await
}

/// Serves the sync trigger on the configured address until the process ends.
pub async fn start_sync_server(config: Config, http: Client) -> io::Result<()> {
    let listener = bind(&config.server_address).await?;
    crate::info!("Listening on http://{}", listener.local_addr()?);

    let service = Arc::new(SyncService::new(config, http));
    serve(listener, sync_router(service)).await
}
