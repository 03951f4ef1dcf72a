//! Message listing, recent view, and context-window routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::routes::{error_response, ok_response};
use crate::state::AppState;
use chatvault_store::MessageFilter;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/recent", get(recent_messages))
        .route("/messages/{id}/context", get(message_context))
}

#[derive(Deserialize)]
struct ListMessagesParams {
    /// Inclusive range start, RFC 3339. Only applied together with `before`.
    after: Option<DateTime<Utc>>,
    /// Inclusive range end, RFC 3339.
    before: Option<DateTime<Utc>>,
    sender: Option<String>,
    chat_jid: Option<String>,
    query: Option<String>,
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    page: i64,
    include_context: Option<bool>,
    context_before: Option<i64>,
    context_after: Option<i64>,
}

/// GET /api/messages — filtered, paginated message listing with optional
/// context expansion.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMessagesParams>,
) -> impl IntoResponse {
    let date_range = match (params.after, params.before) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };
    let filter = MessageFilter {
        date_range,
        sender: params.sender,
        chat_jid: params.chat_jid,
        query: params.query,
        limit: params.limit,
        page: params.page,
        include_context: params.include_context.unwrap_or(true),
        context_before: params.context_before.unwrap_or(1),
        context_after: params.context_after.unwrap_or(1),
    };
    match state.engine.list_messages(&filter) {
        Ok(messages) => ok_response(messages).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct RecentParams {
    #[serde(default)]
    limit: i64,
}

/// GET /api/messages/recent — newest messages across all chats.
async fn recent_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> impl IntoResponse {
    match state.engine.recent_messages(params.limit) {
        Ok(messages) => ok_response(messages).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ContextParams {
    before: Option<i64>,
    after: Option<i64>,
}

/// GET /api/messages/{id}/context — window around one message, 404 when the
/// id matches no stored row.
async fn message_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ContextParams>,
) -> impl IntoResponse {
    let before = params.before.unwrap_or(5);
    let after = params.after.unwrap_or(5);
    match state.engine.message_context(&id, before, after) {
        Ok(context) => ok_response(context).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
