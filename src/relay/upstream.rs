//! Outbound client for the fixed upstream.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::relay::error::RelayError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over a shared `reqwest::Client`.
///
/// No timeout and no retry: a call runs until the upstream answers or the
/// connection fails.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue `GET url` with the given credential, if any.
    pub async fn fetch(
        &self,
        url: &Url,
        authorization: Option<HeaderValue>,
    ) -> Result<reqwest::Response, RelayError> {
        let mut request = self.client.get(url.clone());
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }

        request.send().await.map_err(RelayError::Network)
    }
}
