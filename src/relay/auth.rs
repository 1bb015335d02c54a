//! Outbound `Authorization` header selection.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::schema::{AuthConfig, AuthMode};

/// Errors resolving the configured credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("server_secret mode requires auth.secret or the {env} environment variable")]
    MissingSecret { env: String },

    #[error("server secret is not a valid header value")]
    InvalidSecret,
}

/// Where the outbound credential comes from.
#[derive(Clone)]
pub enum AuthStrategy {
    PassThrough,
    ServerSecret(HeaderValue),
}

impl AuthStrategy {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        match config.mode {
            AuthMode::PassThrough => Ok(Self::PassThrough),
            AuthMode::ServerSecret => {
                let secret = config.resolve_secret().ok_or_else(|| AuthError::MissingSecret {
                    env: config.secret_env.clone(),
                })?;
                let mut value =
                    HeaderValue::from_str(&secret).map_err(|_| AuthError::InvalidSecret)?;
                value.set_sensitive(true);
                Ok(Self::ServerSecret(value))
            }
        }
    }

    /// The `Authorization` value to send upstream for a request with these headers.
    ///
    /// Pass-through copies the inbound value verbatim, including its absence.
    pub fn authorization(&self, inbound: &HeaderMap) -> Option<HeaderValue> {
        match self {
            Self::PassThrough => inbound.get(AUTHORIZATION).cloned(),
            Self::ServerSecret(secret) => Some(secret.clone()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::ServerSecret(_) => "server_secret",
        }
    }
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
