//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the relay route
//! - Wire up middleware (tracing, request ID)
//! - Swap in reloaded relay settings
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, RelayConfig};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::relay::{RelaySettings, UpstreamClient};

/// Path served by the relay.
pub const RELAY_PATH: &str = "/api";

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub settings: Arc<ArcSwap<RelaySettings>>,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
    settings: Arc<ArcSwap<RelaySettings>>,
}

impl RelayServer {
    /// Create a new relay server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let settings = Arc::new(ArcSwap::from_pointee(RelaySettings::from_config(&config)?));
        let state = AppState {
            client: UpstreamClient::new(&config.upstream)?,
            settings: settings.clone(),
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            settings,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route(RELAY_PATH, get(relay_handler).head(reject_head))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on the given listener.
    ///
    /// Configs arriving on `config_updates` replace the relay settings; the
    /// listener address is fixed for the server's lifetime.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.settings.load().upstream,
            "Relay server starting"
        );

        let reload = tokio::spawn(apply_config_updates(
            config_updates,
            self.settings.clone(),
            self.config.listener.bind_address.clone(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload.abort();
        tracing::info!("Relay server stopped");
        Ok(())
    }

    /// Get a reference to the config the server started with.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

async fn apply_config_updates(
    mut updates: mpsc::UnboundedReceiver<RelayConfig>,
    settings: Arc<ArcSwap<RelaySettings>>,
    bind_address: String,
) {
    while let Some(config) = updates.recv().await {
        if config.listener.bind_address != bind_address {
            tracing::warn!(
                current = %bind_address,
                requested = %config.listener.bind_address,
                "Bind address changes need a restart; ignoring"
            );
        }

        match RelaySettings::from_config(&config) {
            Ok(next) => {
                tracing::info!(
                    upstream = %next.upstream,
                    auth = next.auth.name(),
                    mode = ?next.mode,
                    "Relay settings reloaded"
                );
                settings.store(Arc::new(next));
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected config update, keeping current settings");
            }
        }
    }
}

/// axum would otherwise answer HEAD with the GET handler, issuing a real upstream call.
async fn reject_head() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET")])
}

/// Relay one inbound request to the upstream.
async fn relay_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let settings = state.settings.load_full();
    let request_id = request_id(&headers);

    tracing::debug!(
        request_id = %request_id,
        upstream = %settings.upstream,
        auth = settings.auth.name(),
        "Relaying request"
    );

    let authorization = settings.auth.authorization(&headers);
    let upstream = state.client.fetch(&settings.upstream, authorization).await;

    if let Ok(ref response) = upstream {
        tracing::debug!(request_id = %request_id, status = %response.status(), "Upstream responded");
    }

    settings.mode.respond(upstream, request_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use crate::config::{AuthMode, ResponseMode};
    use crate::http::request::X_REQUEST_ID;

    fn server() -> RelayServer {
        RelayServer::new(RelayConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = server()
            .router()
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(RELAY_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn head_is_not_relayed() {
        let upstream = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = RelayConfig::default();
        config.upstream.url = format!("http://{}/api", upstream.local_addr().unwrap());
        config.upstream.system_proxy = false;

        let request = Request::builder()
            .method(Method::HEAD)
            .uri(RELAY_PATH)
            .body(Body::empty())
            .unwrap();
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            RelayServer::new(config).unwrap().router().oneshot(request),
        )
        .await
        .expect("HEAD was relayed to a silent upstream")
        .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");

        let accepted = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            upstream.accept(),
        )
        .await;
        assert!(accepted.is_err(), "HEAD must not reach the upstream");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let response = server()
            .router()
            .oneshot(
                Request::get("/other")
                    .header(X_REQUEST_ID, "caller-id-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "caller-id-7");
    }

    #[tokio::test]
    async fn request_id_is_generated() {
        let response = server()
            .router()
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let mut config = RelayConfig::default();
        config.auth.mode = AuthMode::ServerSecret;
        config.auth.secret_env = "NORTH_RELAY_SERVER_TEST_UNSET".into();

        assert!(matches!(
            RelayServer::new(config),
            Err(ServerError::Config(ConfigError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn config_updates_swap_settings() {
        let server = server();
        let settings = server.settings.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut next = RelayConfig::default();
        next.response.mode = ResponseMode::StreamThrough;
        next.upstream.url = "http://127.0.0.1:1/api".into();
        tx.send(next).unwrap();

        let mut bad = RelayConfig::default();
        bad.upstream.url = "gopher://nowhere".into();
        tx.send(bad).unwrap();
        drop(tx);

        apply_config_updates(rx, settings.clone(), "0.0.0.0:8080".into()).await;

        let current = settings.load();
        assert_eq!(current.mode, ResponseMode::StreamThrough);
        assert_eq!(current.upstream.as_str(), "http://127.0.0.1:1/api");
    }
}
