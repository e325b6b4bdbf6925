//! wishlist-ai library interface
//!
//! Travel wishlist service: places are saved as soon as an AI lookup
//! confirms them and enriched with a travel guide in the background.

pub mod api;
pub mod error;
pub mod filter;
pub mod models;
pub mod services;
pub mod store;
pub mod workflow;

pub use crate::error::{AddPlaceError, ApiError, ApiResult, StoreError};

use axum::{extract::DefaultBodyLimit, Router};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wishlist_common::config::DEFAULT_UPLOAD_LIMIT_MB;
use wishlist_common::events::EventBus;

use crate::store::SharedStore;
use crate::workflow::EnrichmentWorkflow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub workflow: EnrichmentWorkflow,
    /// Event bus feeding `/events`
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Request body cap; add-place bodies carry the photo base64-encoded
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(workflow: EnrichmentWorkflow, event_bus: EventBus) -> Self {
        Self {
            store: workflow.store().clone(),
            workflow,
            event_bus,
            startup_time: Utc::now(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_MB * 1024 * 1024,
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit_bytes = bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let body_limit = DefaultBodyLimit::max(state.upload_limit_bytes);

    Router::new()
        .merge(api::place_routes())
        .merge(api::tag_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
