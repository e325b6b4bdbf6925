//! Error types for wishlist-ai
//!
//! - [`StoreError`]: persistence problems, always recoverable
//! - [`AddPlaceError`]: reasons a submission is rejected with no state created
//! - [`ApiError`]: HTTP mapping of both

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::ResolveError;

/// Persistence errors
///
/// Never fatal: the in-memory store stays authoritative for the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Stored payload missing, unreadable or malformed; treated as no data
    #[error("Could not load saved data '{key}': {message}")]
    PersistenceRead { key: String, message: String },

    /// Durable write failed; the in-memory mutation is kept
    #[error("Could not save latest changes to '{key}': {message}")]
    PersistenceWrite { key: String, message: String },

    /// A mutation running on the blocking pool did not complete
    #[error("Store task failed: {0}")]
    TaskFailed(String),
}

/// Reasons an add-place submission is rejected
///
/// Detail-fetch failures are deliberately absent: they only show on the
/// place itself.
#[derive(Debug, Error)]
pub enum AddPlaceError {
    /// Blank place name
    #[error("Please enter a place name.")]
    EmptyName,

    /// Name already present (case-insensitive)
    #[error("\"{0}\" is already on your wishlist.")]
    DuplicatePlace(String),

    /// AI reports the place does not exist
    #[error("Could not find information for \"{0}\". Please check the spelling.")]
    PlaceNotFound(String),

    /// Basic resolution failed (transport, service or parse error)
    #[error("{}", lookup_failure_message(.0))]
    LookupFailed(ResolveError),

    /// Supplied image could not be turned into a persistable form
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The optimistic save could not be applied
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AddPlaceError {
    /// True when the lookup failed only because no API key is configured
    pub fn is_missing_credentials(&self) -> bool {
        matches!(
            self,
            AddPlaceError::LookupFailed(ResolveError::MissingCredentials(_))
        )
    }
}

fn lookup_failure_message(error: &ResolveError) -> String {
    match error {
        ResolveError::MissingCredentials(message) => message.clone(),
        other => format!("Could not fetch basic place information from AI: {}", other),
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - duplicate place, place still loading
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream AI service failed (502)
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// AI service not configured (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AddPlaceError> for ApiError {
    fn from(err: AddPlaceError) -> Self {
        let message = err.to_string();
        match err {
            AddPlaceError::DuplicatePlace(_) => ApiError::Conflict(message),
            AddPlaceError::PlaceNotFound(_) => ApiError::NotFound(message),
            AddPlaceError::EmptyName | AddPlaceError::InvalidImage(_) => {
                ApiError::BadRequest(message)
            }
            AddPlaceError::LookupFailed(ResolveError::MissingCredentials(_)) => {
                ApiError::ServiceUnavailable(message)
            }
            AddPlaceError::LookupFailed(_) => ApiError::BadGateway(message),
            AddPlaceError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "LOOKUP_FAILED", msg),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MISSING_CREDENTIALS",
                msg,
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
