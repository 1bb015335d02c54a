//! North Relay Library
//!
//! Relays `GET /api` to one fixed upstream with an `Authorization`
//! credential attached, and hands the upstream reply back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
