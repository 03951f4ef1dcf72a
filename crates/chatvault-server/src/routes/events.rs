//! Producer-facing enqueue seam for bridges that deliver events over HTTP.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::state::AppState;
use chatvault_ingest::ChatEvent;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events", post(submit_event))
}

/// POST /api/events — enqueue one chat-update event for the pipeline.
///
/// The send awaits queue capacity, so a slow store backpressures the caller
/// here rather than dropping the event.
async fn submit_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ChatEvent>,
) -> impl IntoResponse {
    match state.event_tx.send(event).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "success": true })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "success": false,
                "message": "event pipeline is not running",
            })),
        ),
    }
}
