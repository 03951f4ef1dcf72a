//! Outbound send passthrough.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/send", post(send_message))
}

#[derive(Deserialize)]
struct SendBody {
    #[serde(default)]
    recipient: String,
    #[serde(default)]
    message: String,
}

/// POST /api/send — relay an outbound message through the protocol bridge.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendBody>,
) -> impl IntoResponse {
    if body.recipient.is_empty() || body.message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "Recipient and message are required",
            })),
        )
            .into_response();
    }

    match state.bridge.send_message(&body.recipient, &body.message).await {
        Ok(outcome) if outcome.success => Json(serde_json::json!({
            "success": true,
            "message": outcome
                .message
                .unwrap_or_else(|| "Message sent successfully".to_string()),
        }))
        .into_response(),
        Ok(outcome) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "success": false,
                "message": outcome.message.unwrap_or_else(|| "Send rejected".to_string()),
            })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
