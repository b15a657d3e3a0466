//! Voice WebSocket route configuration
//!
//! # Endpoint
//!
//! `GET /voice` - WebSocket upgrade for the real-time audio session
//!
//! # Protocol
//!
//! After the upgrade, clients send:
//! - JSON control frames: `{"type":"start"}`, `{"type":"end"}`,
//!   `{"type":"sample_rate","sample_rate":24000}`
//! - Binary frames carrying raw audio chunks
//!
//! The server responds with:
//! - `{"type":"transcript","text":"..."}` text frames as speech is recognized
//! - Binary frames carrying synthesized audio

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::voice::voice_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice WebSocket router
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice", get(voice_handler))
        .layer(TraceLayer::new_for_http())
}
