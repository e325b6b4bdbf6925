//! Gemini API client
//!
//! Uses `generateContent` with a JSON response schema so the model answers
//! with a document matching [`BasicResolution`] or [`DetailedResolution`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use wishlist_common::config::{is_valid_key, GeminiConfig, API_KEY_ENV};

use super::resolver::{BasicResolution, DetailedResolution, PlaceResolver, ResolveError};

const USER_AGENT: &str = concat!("travel-wishlist/", env!("CARGO_PKG_VERSION"));

/// Rate limiter enforcing a minimum spacing between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Gemini rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client; a missing key is only reported when a lookup runs
    pub fn new(config: &GeminiConfig, api_key: Option<String>) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ResolveError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(config.min_request_interval_ms)),
            api_key: api_key.filter(|k| is_valid_key(k)),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn api_key(&self) -> Result<&str, ResolveError> {
        self.api_key.as_deref().ok_or_else(|| {
            ResolveError::MissingCredentials(format!(
                "API key is not configured. Set {} or gemini.api_key in the config file to add new places.",
                API_KEY_ENV
            ))
        })
    }

    /// Run one structured generation and decode the answer as `T`
    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Value,
    ) -> Result<T, ResolveError> {
        let api_key = self.api_key()?;

        self.rate_limiter.wait().await;

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        tracing::debug!(model = %self.model, "Querying Gemini API");

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ResolveError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 429 {
            return Err(ResolveError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResolveError::ApiError(status.as_u16(), error_text));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::ParseError(e.to_string()))?;

        parse_generated(&generated)
    }
}

#[async_trait]
impl PlaceResolver for GeminiClient {
    async fn resolve_basic(&self, place_name: &str) -> Result<BasicResolution, ResolveError> {
        let basic: BasicResolution = self
            .generate(basic_prompt(place_name), basic_place_schema())
            .await?;

        tracing::info!(
            place = %place_name,
            exists = basic.place_exists,
            country = %basic.country_name,
            "Basic place resolution received"
        );

        Ok(basic)
    }

    async fn resolve_details(
        &self,
        place_name: &str,
    ) -> Result<DetailedResolution, ResolveError> {
        let details: DetailedResolution = self
            .generate(detailed_prompt(place_name), detailed_place_schema())
            .await?;

        tracing::info!(
            place = %place_name,
            tags = details.tags.len(),
            "Detailed place resolution received"
        );

        Ok(details)
    }
}

/// Decode the JSON document carried in the first candidate's text parts
fn parse_generated<T: DeserializeOwned>(
    response: &GenerateContentResponse,
) -> Result<T, ResolveError> {
    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(ResolveError::EmptyResponse);
    }

    serde_json::from_str(text).map_err(|e| ResolveError::ParseError(e.to_string()))
}

fn basic_prompt(place_name: &str) -> String {
    format!(
        "Provide only the basic geographical information for the following place: \"{}\". \
         If you cannot identify it, mark 'placeExists' as false.",
        place_name
    )
}

fn detailed_prompt(place_name: &str) -> String {
    format!(
        "You are a world-class travel agent and geographer. Analyze the following place name \
         and provide its coordinates, a comprehensive travel guide, and relevant tags. Place: \"{}\"",
        place_name
    )
}

fn basic_place_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "placeExists": {
                "type": "BOOLEAN",
                "description": "Whether this is a real, known geographical place.",
            },
            "countryName": {
                "type": "STRING",
                "description": "Full name of the country the place is in. Empty string if the place does not exist.",
            },
            "countryCode": {
                "type": "STRING",
                "description": "Two-letter ISO 3166-1 alpha-2 country code. Empty string if the place does not exist.",
            },
        },
        "required": ["placeExists", "countryName", "countryCode"],
    })
}

fn detailed_place_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {
                "type": "STRING",
                "description": "One sentence on what this place is known for.",
            },
            "latitude": { "type": "NUMBER", "description": "Latitude of the place." },
            "longitude": { "type": "NUMBER", "description": "Longitude of the place." },
            "detailedInfo": {
                "type": "OBJECT",
                "description": "Travel guide information.",
                "properties": {
                    "whyFamous": {
                        "type": "STRING",
                        "description": "A paragraph on why travellers and explorers visit this place.",
                    },
                    "thingsToDo": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "3-5 of the best things to do here.",
                    },
                    "nearbyAttractions": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "2-3 well-known attractions nearby.",
                    },
                    "bestTimeToVisit": {
                        "type": "STRING",
                        "description": "Best season or months to visit.",
                    },
                    "estimatedBudget": {
                        "type": "STRING",
                        "description": "Rough daily budget for a solo traveller, including currency.",
                    },
                    "flightsInfo": {
                        "type": "STRING",
                        "description": "Nearest major international airport (IATA code and name).",
                    },
                },
                "required": [
                    "whyFamous", "thingsToDo", "nearbyAttractions",
                    "bestTimeToVisit", "estimatedBudget", "flightsInfo",
                ],
            },
            "tags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3-5 tags such as Nature, History, Adventure, Foodie, Hidden Gem, Beach, Mountain.",
            },
        },
        "required": ["description", "latitude", "longitude", "detailedInfo", "tags"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GenerateContentResponse {
        serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .unwrap()
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(250);
        assert_eq!(limiter.min_interval, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_rate_limiter_spacing() {
        let limiter = RateLimiter::new(200);
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_disabled_rate_limiter_does_not_wait() {
        let limiter = RateLimiter::new(0);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.wait().await;
        }

        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_parse_generated_basic() {
        let response = response_with_text(
            " {\"placeExists\": true, \"countryName\": \"Peru\", \"countryCode\": \"PE\"}\n",
        );
        let basic: BasicResolution = parse_generated(&response).unwrap();
        assert_eq!(basic.country_code, "PE");
    }

    #[test]
    fn test_parse_generated_empty() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        let result: Result<BasicResolution, _> = parse_generated(&response);
        assert!(matches!(result, Err(ResolveError::EmptyResponse)));
    }

    #[test]
    fn test_parse_generated_malformed() {
        let response = response_with_text("{\"placeExists\": tru");
        let result: Result<BasicResolution, _> = parse_generated(&response);
        assert!(matches!(result, Err(ResolveError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = GeminiClient::new(&GeminiConfig::default(), Some("   ".to_string())).unwrap();
        assert!(!client.has_credentials());

        let result = client.resolve_basic("Cusco").await;
        assert!(matches!(result, Err(ResolveError::MissingCredentials(_))));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let mut config = GeminiConfig::default();
        config.base_url = "http://localhost:9999/v1beta/".to_string();
        let client = GeminiClient::new(&config, Some("k".to_string())).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
