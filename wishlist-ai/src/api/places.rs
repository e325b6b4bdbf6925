//! Place endpoints
//!
//! Grid, list and map views take the `?search=&tag=` filter. Mutations
//! return the updated place.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::filter::{self, FilterCriteria};
use crate::models::{Country, Place};
use crate::services::ImageUpload;
use crate::store;
use crate::workflow::AddPlaceRequest;
use crate::AppState;

/// POST /api/places request
#[derive(Debug, Deserialize)]
pub struct AddPlaceBody {
    pub name: String,
    /// Base64 image bytes, optionally as a full `data:` URI
    pub image_base64: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /api/places response
#[derive(Debug, Serialize, Deserialize)]
pub struct AddPlaceResponse {
    pub place_id: Uuid,
    pub country_name: String,
    pub is_fetching_details: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagsBody {
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleTagBody {
    pub tag: String,
}

/// GET /api/countries
pub async fn list_countries(
    State(state): State<AppState>,
    Query(criteria): Query<FilterCriteria>,
) -> Json<Vec<Country>> {
    let store = state.store.read().await;
    Json(filter::filter_countries(store.countries(), &criteria))
}

/// GET /api/places
pub async fn list_places(
    State(state): State<AppState>,
    Query(criteria): Query<FilterCriteria>,
) -> Json<Vec<Place>> {
    let store = state.store.read().await;
    Json(filter::filter_places(store.countries(), &criteria))
}

/// GET /api/map
pub async fn list_map_places(
    State(state): State<AppState>,
    Query(criteria): Query<FilterCriteria>,
) -> Json<Vec<Place>> {
    let store = state.store.read().await;
    Json(filter::mappable_places(store.countries(), &criteria))
}

/// POST /api/places
///
/// Responds 202 once the place is saved; details arrive in the background
/// and are announced on `/events`. The image is decoded by the workflow,
/// after the duplicate check and the basic lookup.
pub async fn add_place(
    State(state): State<AppState>,
    Json(body): Json<AddPlaceBody>,
) -> ApiResult<(StatusCode, Json<AddPlaceResponse>)> {
    let outcome = state
        .workflow
        .add_place(AddPlaceRequest {
            name: body.name,
            image: ImageUpload::Base64(body.image_base64),
            note: body.note,
            tags: body.tags,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AddPlaceResponse {
            place_id: outcome.place_id,
            country_name: outcome.country_name,
            is_fetching_details: true,
        }),
    ))
}

/// GET /api/places/:id
///
/// Detail view. A place still fetching details is not selectable (409).
pub async fn get_place(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> ApiResult<Json<Place>> {
    let store = state.store.read().await;

    if let Some(place) = store.selectable_place(place_id) {
        return Ok(Json(place.clone()));
    }

    match store.find_place(place_id) {
        Some(place) => Err(ApiError::Conflict(format!(
            "Details for \"{}\" are still loading",
            place.name
        ))),
        None => Err(not_found(place_id)),
    }
}

/// DELETE /api/places/:id
pub async fn delete_place(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    store::mutate(&state.store, move |store| store.remove_place(place_id))
        .await?
        .ok_or_else(|| not_found(place_id))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/places/:id/visited
pub async fn toggle_visited(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> ApiResult<Json<Place>> {
    store::mutate(&state.store, move |store| {
        store
            .toggle_visited(place_id)
            .and_then(|_| store.find_place(place_id).cloned())
    })
    .await?
    .map(Json)
    .ok_or_else(|| not_found(place_id))
}

/// PUT /api/places/:id/tags
pub async fn update_tags(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
    Json(body): Json<UpdateTagsBody>,
) -> ApiResult<Json<Place>> {
    let tags: Vec<String> = body
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    store::mutate(&state.store, move |store| {
        if store.update_tags(place_id, tags) {
            store.find_place(place_id).cloned()
        } else {
            None
        }
    })
    .await?
    .map(Json)
    .ok_or_else(|| not_found(place_id))
}

/// POST /api/places/:id/tags/toggle
pub async fn toggle_tag(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
    Json(body): Json<ToggleTagBody>,
) -> ApiResult<Json<Place>> {
    let tag = body.tag.trim().to_string();
    if tag.is_empty() {
        return Err(ApiError::BadRequest("Tag must not be blank".to_string()));
    }

    store::mutate(&state.store, move |store| {
        if store.toggle_tag(place_id, &tag) {
            store.find_place(place_id).cloned()
        } else {
            None
        }
    })
    .await?
    .map(Json)
    .ok_or_else(|| not_found(place_id))
}

fn not_found(place_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Place not found: {}", place_id))
}

pub fn place_routes() -> Router<AppState> {
    Router::new()
        .route("/api/countries", get(list_countries))
        .route("/api/places", get(list_places).post(add_place))
        .route("/api/map", get(list_map_places))
        .route("/api/places/:id", get(get_place).delete(delete_place))
        .route("/api/places/:id/visited", post(toggle_visited))
        .route("/api/places/:id/tags", put(update_tags))
        .route("/api/places/:id/tags/toggle", post(toggle_tag))
}
