use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::auth::SharedSecret;
use crate::handlers;
use crate::relay::Relay;
use crate::response;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub secret: SharedSecret,
}

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/send-message", post(handlers::send_message))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Request handler panicked");
    response::internal_error("Internal server error")
}
