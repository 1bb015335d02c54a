//! Relay failures and the reply they collapse to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Body of every failed decode-and-reencode reply.
pub const FAILURE_MESSAGE: &str = "Failed to fetch data";

/// Errors on the path from inbound request to upstream reply.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream could not be reached, or the body could not be read.
    #[error("upstream request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// Upstream answered outside the 2xx range.
    #[error("upstream returned {0}")]
    UpstreamStatus(StatusCode),

    /// Upstream body was not valid JSON.
    #[error("upstream body is not JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RelayError::Decode(e)
        } else {
            RelayError::Network(e)
        }
    }
}

/// Every variant maps to the same reply so upstream detail never reaches the caller.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": FAILURE_MESSAGE })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_reply_is_generic() {
        let response = RelayError::UpstreamStatus(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"Failed to fetch data"}"#);
    }
}
