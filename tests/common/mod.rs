//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use north_relay::config::RelayConfig;
use north_relay::http::RelayServer;
use north_relay::lifecycle::Shutdown;

/// What the mock upstream answers with.
#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'static [u8],
}

/// A mock upstream serving `GET /api` and recording each `Authorization` it sees.
pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// `Authorization` values received so far, `None` where absent.
    pub fn seen_authorization(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct UpstreamState {
    canned: Canned,
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

async fn upstream_handler(State(state): State<UpstreamState>, headers: HeaderMap) -> impl IntoResponse {
    let auth = headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap().to_string());
    state.seen.lock().unwrap().push(auth);

    (
        StatusCode::from_u16(state.canned.status).unwrap(),
        [(header::CONTENT_TYPE, state.canned.content_type)],
        state.canned.body,
    )
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_upstream(canned: Canned) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/api", get(upstream_handler))
        .with_state(UpstreamState {
            canned,
            seen: seen.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, seen }
}

/// A port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

/// A running relay and the handle that stops it.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RunningRelay {
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the relay on an ephemeral port with the given config.
pub async fn start_relay(mut config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();
    config.upstream.system_proxy = false;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = RelayServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningRelay { addr, shutdown }
}

/// Client that never routes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
