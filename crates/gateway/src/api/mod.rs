pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the HTTP surface: the platform webhook plus a liveness probe.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::receive))
        .route("/healthz", get(webhook::health))
}
