//! HTTP Server & Routing Integration Tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use helpers::{png_bytes, sample_details, seeded_place, wait_until_settled, MockResolver};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use wishlist_ai::services::ResolveError;
use wishlist_ai::store::{PlaceStore, SharedStore};
use wishlist_ai::workflow::EnrichmentWorkflow;
use wishlist_ai::{build_router, AppState};
use wishlist_common::events::EventBus;

struct TestApp {
    router: Router,
    store: SharedStore,
}

fn test_app(store: PlaceStore, resolver: Arc<MockResolver>) -> TestApp {
    test_app_with(store, resolver, |state| state)
}

fn test_app_with(
    store: PlaceStore,
    resolver: Arc<MockResolver>,
    configure: impl FnOnce(AppState) -> AppState,
) -> TestApp {
    let event_bus = EventBus::new(100);
    let workflow = EnrichmentWorkflow::new(
        store.with_event_bus(event_bus.clone()).into_shared(),
        resolver,
    );
    let state = configure(AppState::new(workflow, event_bus));
    let store = state.store.clone();
    TestApp {
        router: build_router(state),
        store,
    }
}

/// Peru holding an enriched Lima (Beach) and Machu Picchu (History)
fn seeded_store() -> (PlaceStore, Uuid, Uuid) {
    let mut store = PlaceStore::in_memory();
    let lima = seeded_place("Lima", &["Beach"]);
    let machu_picchu = seeded_place("Machu Picchu", &["History"]);
    let (lima_id, machu_picchu_id) = (lima.id, machu_picchu.id);
    store.add_place("Peru", "PE", lima).unwrap();
    store.add_place("Peru", "PE", machu_picchu).unwrap();
    (store, lima_id, machu_picchu_id)
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        // Framework rejections (e.g. 413) carry plain text
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

fn add_body(name: &str, tags: &[&str]) -> Value {
    json!({
        "name": name,
        "image_base64": STANDARD.encode(png_bytes()),
        "note": "go in the dry season",
        "tags": tags,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(PlaceStore::in_memory(), Arc::new(MockResolver::new()));

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wishlist-ai");
    assert_eq!(body["place_count"], 0);
    assert!(body.get("persistence_advisory").is_none());
}

#[tokio::test]
async fn test_health_reports_and_clears_advisory() {
    let storage = Arc::new(wishlist_ai::store::MemoryKeyValueStore::new());
    let (store, _) = PlaceStore::open(storage.clone());
    let app = test_app(store, Arc::new(MockResolver::new()));

    storage.set_fail_writes(true);
    let (status, _) = send(&app, "POST", "/api/tags/custom", Some(json!({"tag": "Zen"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(body["status"], "degraded");
    assert!(body["persistence_advisory"].as_str().unwrap().contains("customTravelTags"));

    let (status, body) = send(&app, "DELETE", "/health/advisory", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_add_place_then_view_details() {
    // Given: a resolver that holds the detail lookup
    let resolver = Arc::new(
        MockResolver::new()
            .with_place("Cusco", "Peru", "PE")
            .with_details("Cusco", sample_details("Inca capital", &["History"]))
            .holding_details(),
    );
    let app = test_app(PlaceStore::in_memory(), resolver.clone());

    // When: a place is submitted
    let (status, body) = send(&app, "POST", "/api/places", Some(add_body("Cusco", &["Foodie"]))).await;

    // Then: accepted immediately, detail view not yet available
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["country_name"], "Peru");
    assert_eq!(body["is_fetching_details"], true);
    let place_id: Uuid = serde_json::from_value(body["place_id"].clone()).unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/places/{}", place_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, places) = send(&app, "GET", "/api/places", None).await;
    assert_eq!(places[0]["isFetchingDetails"], true);
    assert_eq!(places[0]["description"], "Fetching details...");

    resolver.release_details(1);
    wait_until_settled(&app.store, place_id).await;

    let (status, place) = send(&app, "GET", &format!("/api/places/{}", place_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(place["description"], "Inca capital");
    assert_eq!(place["note"], "go in the dry season");
    assert_eq!(place["tags"], json!(["Foodie", "History"]));
    assert!(place["detailedInfo"]["whyFamous"].is_string());
}

#[tokio::test]
async fn test_add_place_error_statuses() {
    let resolver = Arc::new(
        MockResolver::new()
            .with_unknown_place("Atlantis")
            .with_basic_error("Cusco", ResolveError::MissingCredentials("no key".to_string()))
            .with_basic_error("Quito", ResolveError::ApiError(500, "boom".to_string())),
    );
    let (store, _, _) = seeded_store();
    let app = test_app(store, resolver);

    let cases = [
        ("lima", StatusCode::CONFLICT, "CONFLICT"),
        ("Atlantis", StatusCode::NOT_FOUND, "NOT_FOUND"),
        ("Cusco", StatusCode::SERVICE_UNAVAILABLE, "MISSING_CREDENTIALS"),
        ("Quito", StatusCode::BAD_GATEWAY, "LOOKUP_FAILED"),
        ("  ", StatusCode::BAD_REQUEST, "BAD_REQUEST"),
    ];

    for (name, expected_status, expected_code) in cases {
        let (status, body) = send(&app, "POST", "/api/places", Some(add_body(name, &[]))).await;
        assert_eq!(status, expected_status, "status for {:?}", name);
        assert_eq!(body["error"]["code"], expected_code, "code for {:?}", name);
    }

    let (_, body) = send(&app, "POST", "/api/places", Some(add_body("Cusco", &[]))).await;
    assert_eq!(body["error"]["message"], "no key");

    assert_eq!(app.store.read().await.places().count(), 2);
}

#[tokio::test]
async fn test_add_place_rejects_bad_image_encoding() {
    let resolver = Arc::new(MockResolver::new().with_place("Cusco", "Peru", "PE"));
    let app = test_app(PlaceStore::in_memory(), resolver.clone());

    let body = json!({"name": "Cusco", "image_base64": "***", "tags": []});
    let (status, body) = send(&app, "POST", "/api/places", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("invalid image encoding"));
    assert_eq!(resolver.detail_calls(), 0);
    assert!(app.store.read().await.countries().is_empty());
}

#[tokio::test]
async fn test_duplicate_checked_before_image_decoding() {
    let resolver = Arc::new(MockResolver::new().with_place("Lima", "Peru", "PE"));
    let (store, _, _) = seeded_store();
    let app = test_app(store, resolver.clone());

    let body = json!({"name": "LIMA", "image_base64": "***", "tags": []});
    let (status, body) = send(&app, "POST", "/api/places", Some(body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(resolver.basic_calls(), 0);
}

/// PNG signature followed by `size` bytes of padding
fn large_png_body(name: &str, size: usize) -> Value {
    let mut image = png_bytes();
    image.resize(image.len() + size, 0);
    json!({
        "name": name,
        "image_base64": STANDARD.encode(&image),
        "tags": [],
    })
}

#[tokio::test]
async fn test_add_place_accepts_multi_megabyte_photo() {
    let resolver = Arc::new(
        MockResolver::new()
            .with_place("Cusco", "Peru", "PE")
            .with_details("Cusco", sample_details("Inca capital", &[])),
    );
    let app = test_app(PlaceStore::in_memory(), resolver);

    let body = large_png_body("Cusco", 3 * 1024 * 1024);
    let (status, body) = send(&app, "POST", "/api/places", Some(body)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let place_id: Uuid = serde_json::from_value(body["place_id"].clone()).unwrap();
    let store = app.store.read().await;
    let place = store.find_place(place_id).unwrap();
    assert!(place.image_url.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_upload_limit_is_configurable() {
    let resolver = Arc::new(MockResolver::new().with_place("Cusco", "Peru", "PE"));
    let app = test_app_with(PlaceStore::in_memory(), resolver.clone(), |state| {
        state.with_upload_limit(1024 * 1024)
    });

    let body = large_png_body("Cusco", 2 * 1024 * 1024);
    let (status, _) = send(&app, "POST", "/api/places", Some(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resolver.basic_calls(), 0);
}

#[tokio::test]
async fn test_filtered_views() {
    let (mut store, _, _) = seeded_store();
    store
        .add_place("Japan", "JP", seeded_place("Kyoto", &["History"]))
        .unwrap();
    store
        .add_place(
            "Japan",
            "JP",
            wishlist_ai::models::Place::new_pending("Osaka", "img", None, vec![]),
        )
        .unwrap();
    let app = test_app(store, Arc::new(MockResolver::new()));

    let (status, countries) = send(&app, "GET", "/api/countries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(countries[0]["name"], "Japan");
    assert_eq!(countries[1]["name"], "Peru");

    let (_, countries) = send(&app, "GET", "/api/countries?tag=History", None).await;
    let summary: Vec<(String, usize)> = countries
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                c["name"].as_str().unwrap().to_string(),
                c["places"].as_array().unwrap().len(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![("Japan".to_string(), 1), ("Peru".to_string(), 1)]
    );

    let (_, places) = send(&app, "GET", "/api/places?search=LI", None).await;
    assert_eq!(places.as_array().unwrap().len(), 1);
    assert_eq!(places[0]["name"], "Lima");

    let (_, mapped) = send(&app, "GET", "/api/map", None).await;
    let names: Vec<_> = mapped
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Kyoto", "Lima", "Machu Picchu"]);
}

#[tokio::test]
async fn test_place_mutations() {
    let (store, lima_id, machu_picchu_id) = seeded_store();
    let app = test_app(store, Arc::new(MockResolver::new()));

    let (status, place) = send(&app, "POST", &format!("/api/places/{}/visited", lima_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(place["visited"], true);

    let (status, place) = send(
        &app,
        "PUT",
        &format!("/api/places/{}/tags", lima_id),
        Some(json!({"tags": ["Surf", "Beach", " ", "Surf"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(place["tags"], json!(["Beach", "Surf"]));

    let (_, place) = send(
        &app,
        "POST",
        &format!("/api/places/{}/tags/toggle", lima_id),
        Some(json!({"tag": "Beach"})),
    )
    .await;
    assert_eq!(place["tags"], json!(["Surf"]));

    let (status, _) = send(&app, "DELETE", &format!("/api/places/{}", lima_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, countries) = send(&app, "GET", "/api/countries", None).await;
    assert_eq!(countries[0]["places"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/places/{}", machu_picchu_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, countries) = send(&app, "GET", "/api/countries", None).await;
    assert_eq!(countries, json!([]));
}

#[tokio::test]
async fn test_unknown_place_is_404() {
    let app = test_app(PlaceStore::in_memory(), Arc::new(MockResolver::new()));
    let id = Uuid::new_v4();

    for (method, uri) in [
        ("GET", format!("/api/places/{}", id)),
        ("DELETE", format!("/api/places/{}", id)),
        ("POST", format!("/api/places/{}/visited", id)),
    ] {
        let (status, body) = send(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_custom_tags() {
    let (store, _, _) = seeded_store();
    let app = test_app(store, Arc::new(MockResolver::new()));

    let (status, body) = send(&app, "POST", "/api/tags/custom", Some(json!({"tag": " Zen "}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tag"], "Zen");
    assert_eq!(body["all_tags"], json!(["Beach", "History", "Zen"]));

    let (status, _) = send(&app, "POST", "/api/tags/custom", Some(json!({"tag": "Beach"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "POST", "/api/tags/custom", Some(json!({"tag": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, custom) = send(&app, "GET", "/api/tags/custom", None).await;
    assert_eq!(custom, json!(["Zen"]));

    let (_, all) = send(&app, "GET", "/api/tags", None).await;
    assert_eq!(all, json!(["Beach", "History", "Zen"]));
}
