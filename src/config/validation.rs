//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Every problem found is
//! reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;
use crate::relay::auth::{AuthError, AuthStrategy};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("upstream.url '{url}' is invalid: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("upstream.url scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Err(e) = parse_upstream_url(&config.upstream.url) {
        errors.push(e);
    }

    if let Err(e) = AuthStrategy::from_config(&config.auth) {
        errors.push(e.into());
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse the upstream URL, accepting only http and https.
pub fn parse_upstream_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUpstreamUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}
