//! HTTP route handlers — thin translators over the query engine and the
//! ingestion channel.

pub mod chats;
pub mod contacts;
pub mod events;
pub mod messages;
pub mod send;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use chatvault_core::Error;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(chats::routes())
        .merge(messages::routes())
        .merge(contacts::routes())
        .merge(send::routes())
        .merge(events::routes())
}

/// Success envelope.
pub(crate) fn ok_response(data: impl serde::Serialize) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// Map an engine error onto a status and error envelope. NotFound keeps its
/// own status so clients can tell "no data" from a failing store.
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(serde_json::json!({ "success": false, "message": err.to_string() })),
    )
}
