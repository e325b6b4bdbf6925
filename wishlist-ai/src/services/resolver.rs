//! AI collaborator contract
//!
//! Any provider able to answer the two lookups below can back the
//! enrichment workflow. [`GeminiClient`](super::GeminiClient) is the
//! production implementation; tests script their own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DetailedPlaceInfo;

/// AI lookup errors
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No API key configured; the message tells the user how to set one
    #[error("{0}")]
    MissingCredentials(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Malformed JSON or missing required fields
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("AI service returned no content")]
    EmptyResponse,
}

/// Basic resolution: does the place exist and where is it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicResolution {
    pub place_exists: bool,
    pub country_name: String,
    /// Two-letter ISO 3166-1 alpha-2 code
    pub country_code: String,
}

/// Detailed resolution: the travel-guide payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResolution {
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: Vec<String>,
    pub detailed_info: DetailedPlaceInfo,
}

/// Resolves place names through a generative-AI service
#[async_trait::async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Establish existence and country of `place_name`
    async fn resolve_basic(&self, place_name: &str) -> Result<BasicResolution, ResolveError>;

    /// Fetch description, coordinates, travel guide and tags for `place_name`
    async fn resolve_details(&self, place_name: &str)
        -> Result<DetailedResolution, ResolveError>;
}
