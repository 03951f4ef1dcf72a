//! Chat listing and lookup routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::routes::{error_response, ok_response};
use crate::state::AppState;
use chatvault_store::{ChatFilter, ChatSort};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chats", get(list_chats))
        .route("/chats/{jid}", get(get_chat))
        .route("/chats/{jid}/messages", get(chat_messages))
}

#[derive(Deserialize)]
struct ListChatsParams {
    query: Option<String>,
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    page: i64,
    include_last_message: Option<bool>,
    sort_by: Option<ChatSort>,
}

/// GET /api/chats — filtered, paginated chat listing.
async fn list_chats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListChatsParams>,
) -> impl IntoResponse {
    let filter = ChatFilter {
        query: params.query,
        limit: params.limit,
        page: params.page,
        include_last_message: params.include_last_message.unwrap_or(true),
        sort_by: params.sort_by.unwrap_or_default(),
    };
    match state.engine.list_chats(&filter) {
        Ok(chats) => ok_response(chats).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct GetChatParams {
    include_last_message: Option<bool>,
}

/// GET /api/chats/{jid} — single chat, 404 when unknown.
async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(jid): Path<String>,
    Query(params): Query<GetChatParams>,
) -> impl IntoResponse {
    let include_last_message = params.include_last_message.unwrap_or(true);
    match state.engine.get_chat(&jid, include_last_message) {
        Ok(chat) => ok_response(chat).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ChatMessagesParams {
    #[serde(default)]
    limit: i64,
}

/// GET /api/chats/{jid}/messages — newest messages in one chat.
async fn chat_messages(
    State(state): State<Arc<AppState>>,
    Path(jid): Path<String>,
    Query(params): Query<ChatMessagesParams>,
) -> impl IntoResponse {
    let limit = if params.limit <= 0 { 50 } else { params.limit };
    match state.engine.store().get_messages(&jid, limit) {
        Ok(messages) => ok_response(messages).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
