use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::chat;
use crate::state::AppState;
use std::sync::Arc;

/// Create the chat API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat/characters", post(chat::create_character))
        .route("/api/chat/conversations", post(chat::create_conversation))
        .route("/api/chat/conversations/{id}", get(chat::get_conversation))
        .route(
            "/api/chat/conversations/{id}/message",
            post(chat::send_message),
        )
        .route(
            "/api/chat/conversations/{id}/stream_message",
            get(chat::stream_message),
        )
        .layer(TraceLayer::new_for_http())
}
