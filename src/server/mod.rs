//! HTTP surface of the relying party
//!
//! [`AppState`] bundles everything the handlers share: the validated
//! configuration, the provider client built from discovery, the session
//! store, the pending-authorization registry and the page renderer.
//! [`router`] wires the flow endpoints; [`serve`] binds a listener and runs
//! until Ctrl-C or SIGTERM.

mod cookies;
mod handlers;
pub mod render;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::config::Config;
use crate::error::{OidcError, Result};
use crate::oidc::client::{build_http_client, ProviderClient};
use crate::oidc::discovery::ProviderMetadata;
use crate::session::{PendingAuthorizations, SessionStore};

use self::render::PageRenderer;

/// Shared state handed to every handler.
///
/// Cloning is cheap; every component is reference counted.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: ProviderClient,
    pub sessions: Arc<SessionStore>,
    pub pending: Arc<PendingAuthorizations>,
    pub renderer: Arc<PageRenderer>,
}

impl AppState {
    /// Assembles the state for a discovered provider.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `provider` - Metadata returned by discovery
    /// * `http` - Shared outbound client, normally the one used for discovery
    ///
    /// # Errors
    ///
    /// Returns an error if the page templates fail to compile.
    pub fn new(config: Config, provider: ProviderMetadata, http: reqwest::Client) -> Result<Self> {
        let client = ProviderClient::new(
            http,
            Arc::new(provider),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        );
        let pending = PendingAuthorizations::with_ttl_seconds(config.session.pending_ttl_seconds);

        Ok(Self {
            config: Arc::new(config),
            client,
            sessions: Arc::new(SessionStore::new()),
            pending: Arc::new(pending),
            renderer: Arc::new(PageRenderer::new()?),
        })
    }

    /// Builds the outbound HTTP client configured for `config`.
    pub fn http_client(config: &Config) -> Result<reqwest::Client> {
        build_http_client(Duration::from_secs(config.http_timeout_seconds))
    }

    /// Provider metadata captured at startup.
    pub fn provider(&self) -> &ProviderMetadata {
        self.client.provider()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route(
            "/auth/callback",
            get(handlers::callback).post(handlers::callback_form),
        )
        .route("/session", get(handlers::session_json))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

/// Serves the router on `addr` until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "OIDC client listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

impl IntoResponse for OidcError {
    fn into_response(self) -> Response {
        let status = match &self {
            OidcError::BadRequest(_) => StatusCode::BAD_REQUEST,
            OidcError::UpstreamExchange(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "Request failed");
        }

        (status, self.to_string()).into_response()
    }
}
