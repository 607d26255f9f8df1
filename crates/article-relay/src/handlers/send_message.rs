//! Synchronous publish endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::article::ArticleMetadata;
use crate::response;
use crate::server::AppState;

/// POST /send-message
///
/// Request headers: `Authorization: Bearer <token>`
///
/// Request body: `{"title", "url", "description", "timestamp", "thumbnailURL"}`
///
/// Responses:
/// - `200 {"ok": true}` once Discord accepted the message
/// - `400 {"error": ...}` for a body that is not JSON or not valid metadata
/// - `401 {"error": "Unauthorized"}`
/// - `500 {"error": ...}` when delivery failed
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    debug!(bytes = body.len(), "Received publish request");

    if !state.secret.authorizes(&headers) {
        warn!("Rejected publish request with missing or invalid credentials");
        return response::unauthorized();
    }
    debug!("Publish request authorized");

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Publish request body is not valid JSON");
            return response::bad_request("Invalid JSON");
        }
    };
    debug!("Publish request body parsed");

    let meta = match ArticleMetadata::from_value(value) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(error = %e, "Publish request carried invalid article metadata");
            return response::bad_request("Invalid article metadata");
        }
    };
    debug!(url = meta.url(), "Article metadata validated");

    match state.relay.announce(&meta).await {
        Ok(()) => {
            info!(url = meta.url(), "Publish request delivered");
            response::ok()
        }
        Err(e) => {
            error!(error = %e, url = meta.url(), "Failed to send to Discord");
            response::internal_error("Failed to send to Discord")
        }
    }
}
