//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default upstream endpoint every request is relayed to.
pub const DEFAULT_UPSTREAM_URL: &str = "https://north-case-api.vercel.app/api";

/// Default environment variable holding the server-side credential.
pub const DEFAULT_SECRET_ENV: &str = "NORTH_CASE_API_KEY";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream endpoint.
    pub upstream: UpstreamConfig,

    /// How the outbound `Authorization` header is produced.
    pub auth: AuthConfig,

    /// How the upstream response is handed back.
    pub response: ResponseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl ListenerConfig {
    /// Address to bind, preferring a command-line override.
    pub fn effective_bind_address<'a>(&'a self, cli_override: Option<&'a str>) -> &'a str {
        cli_override.unwrap_or(&self.bind_address)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URL of the upstream API, path included.
    pub url: String,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for the outbound call.
    /// Read once at startup; not affected by hot reload.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            system_proxy: true,
        }
    }
}

/// Source of the outbound credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Copy the caller's `Authorization` header verbatim.
    #[default]
    PassThrough,
    /// Ignore the caller and attach the server-held secret.
    ServerSecret,
}

/// Authorization configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,

    /// Inline secret. Takes precedence over `secret_env` when set.
    /// Prefer the environment variable outside local development.
    pub secret: Option<String>,

    /// Environment variable read for the secret in server-secret mode.
    pub secret_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::PassThrough,
            secret: None,
            secret_env: DEFAULT_SECRET_ENV.to_string(),
        }
    }
}

impl AuthConfig {
    /// Resolve the server-held secret, inline value first, then environment.
    pub fn resolve_secret(&self) -> Option<String> {
        self.secret
            .clone()
            .or_else(|| std::env::var(&self.secret_env).ok())
            .filter(|s| !s.is_empty())
    }
}

// Hand-written so the inline secret never reaches a log line.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("secret_env", &self.secret_env)
            .finish()
    }
}

/// How the upstream body is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Stream the body untouched, forcing `Content-Type: application/json`.
    StreamThrough,
    /// Parse the body as JSON and re-encode it; every failure becomes a generic 500.
    #[default]
    DecodeReencode,
}

/// Response configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResponseConfig {
    pub mode: ResponseMode,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
