//! Tag vocabulary endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::store;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCustomTagBody {
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCustomTagResponse {
    pub tag: String,
    pub all_tags: Vec<String>,
}

/// GET /api/tags
///
/// Every tag on any place plus the custom tags, sorted.
pub async fn list_all_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.read().await.all_tags())
}

/// GET /api/tags/custom
pub async fn list_custom_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.read().await.custom_tags().to_vec())
}

/// POST /api/tags/custom
pub async fn add_custom_tag(
    State(state): State<AppState>,
    Json(body): Json<AddCustomTagBody>,
) -> ApiResult<(StatusCode, Json<AddCustomTagResponse>)> {
    let tag = body.tag.trim().to_string();
    if tag.is_empty() {
        return Err(ApiError::BadRequest("Tag must not be blank".to_string()));
    }

    let added = tag.clone();
    let all_tags = store::mutate(&state.store, move |store| {
        store.add_custom_tag(&added).then(|| store.all_tags())
    })
    .await?
    .ok_or_else(|| ApiError::Conflict(format!("Tag \"{}\" already exists", tag)))?;

    Ok((
        StatusCode::CREATED,
        Json(AddCustomTagResponse { tag, all_tags }),
    ))
}

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(list_all_tags))
        .route("/api/tags/custom", get(list_custom_tags).post(add_custom_tag))
}
