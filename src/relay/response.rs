//! Turning an upstream response into the caller's reply.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::config::schema::ResponseMode;
use crate::relay::error::RelayError;

impl ResponseMode {
    /// Build the reply for one relayed request.
    pub async fn respond(
        self,
        upstream: Result<reqwest::Response, RelayError>,
        request_id: &str,
    ) -> Response {
        match self {
            ResponseMode::StreamThrough => stream_through(upstream, request_id),
            ResponseMode::DecodeReencode => match decode(upstream).await {
                Ok((status, value)) => (status, Json(value)).into_response(),
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Relay failed");
                    e.into_response()
                }
            },
        }
    }
}

/// Forward status and body untouched. Content type is always JSON.
fn stream_through(upstream: Result<reqwest::Response, RelayError>, request_id: &str) -> Response {
    let upstream = match upstream {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let status = upstream.status();
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn decode(
    upstream: Result<reqwest::Response, RelayError>,
) -> Result<(StatusCode, Value), RelayError> {
    let upstream = upstream?;
    let status = upstream.status();
    if !status.is_success() {
        return Err(RelayError::UpstreamStatus(status));
    }

    let value = upstream.json::<Value>().await?;
    Ok((status, value))
}
