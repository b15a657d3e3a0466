//! Health check endpoint.

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe. Deliberately free of downstream checks so load
/// balancers get an answer even when every LLM backend is down — reply
/// generation degrades to the offline fallback rather than to an outage.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "parley-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
