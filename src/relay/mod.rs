//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound GET /api
//!     → auth.rs (pick Authorization: caller's or server secret)
//!     → upstream.rs (GET upstream with that credential)
//!     → response.rs (stream through, or decode and re-encode)
//!     → error.rs (failures collapse to one generic reply)
//! ```
//!
//! # Design Decisions
//! - Stateless per request; the only shared value is the settings snapshot
//! - Decode mode never leaks upstream status or error detail

pub mod auth;
pub mod error;
pub mod response;
pub mod upstream;

use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::{RelayConfig, ResponseMode};
use crate::config::validation::{parse_upstream_url, validate_config};

pub use auth::{AuthError, AuthStrategy};
pub use error::RelayError;
pub use upstream::UpstreamClient;

/// Resolved, ready-to-use relay settings derived from a `RelayConfig`.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub upstream: Url,
    pub auth: AuthStrategy,
    pub mode: ResponseMode,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let upstream =
            parse_upstream_url(&config.upstream.url).map_err(|e| ConfigError::Validation(vec![e]))?;
        let auth = AuthStrategy::from_config(&config.auth)
            .map_err(|e| ConfigError::Validation(vec![e.into()]))?;

        Ok(Self {
            upstream,
            auth,
            mode: config.response.mode,
        })
    }
}
