//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while a persistence advisory stands
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub place_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_advisory: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let store = state.store.read().await;
    let persistence_advisory = store.advisory().map(|e| e.to_string());
    let status = if persistence_advisory.is_some() {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "wishlist-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        place_count: store.places().count(),
        persistence_advisory,
    })
}

/// DELETE /health/advisory
///
/// Acknowledge the standing persistence advisory.
pub async fn clear_advisory(State(state): State<AppState>) -> Json<HealthResponse> {
    state.store.write().await.clear_advisory();
    health_check(State(state)).await
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/advisory", axum::routing::delete(clear_advisory))
}
