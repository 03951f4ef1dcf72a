//! Contact search and per-contact views.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::routes::{error_response, ok_response};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts/search", get(search_contacts))
        .route("/contacts/{jid}/chats", get(contact_chats))
        .route("/contacts/{jid}/last-interaction", get(last_interaction))
        .route("/contacts/{jid}/direct-chat", get(direct_chat))
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
}

/// GET /api/contacts/search — non-group chats matching by name or JID.
async fn search_contacts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    match state.engine.search_contacts(&params.query) {
        Ok(contacts) => ok_response(contacts).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ContactChatsParams {
    #[serde(default)]
    limit: i64,
    #[serde(default)]
    page: i64,
}

/// GET /api/contacts/{jid}/chats — every chat involving the contact.
async fn contact_chats(
    State(state): State<Arc<AppState>>,
    Path(jid): Path<String>,
    Query(params): Query<ContactChatsParams>,
) -> impl IntoResponse {
    match state.engine.contact_chats(&jid, params.limit, params.page) {
        Ok(chats) => ok_response(chats).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// GET /api/contacts/{jid}/last-interaction — 404 when the contact never
/// exchanged a message.
async fn last_interaction(
    State(state): State<Arc<AppState>>,
    Path(jid): Path<String>,
) -> impl IntoResponse {
    match state.engine.last_interaction(&jid) {
        Ok(message) => ok_response(message).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// GET /api/contacts/{jid}/direct-chat — the one-to-one chat for a phone
/// number or JID, domain appended when missing.
async fn direct_chat(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> impl IntoResponse {
    match state.engine.direct_chat_by_contact(&phone) {
        Ok(chat) => ok_response(chat).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
