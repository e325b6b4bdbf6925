//! Store, workflow and payload fixtures

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wishlist_ai::models::{DetailedPlaceInfo, Place};
use wishlist_ai::services::{DetailedResolution, ImageUpload};
use wishlist_ai::store::{PlaceStore, SharedStore};
use wishlist_ai::workflow::{AddPlaceRequest, EnrichmentWorkflow};

use super::MockResolver;

/// Minimal PNG signature plus IHDR chunk header
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    ]
}

pub fn add_request(name: &str, tags: &[&str]) -> AddPlaceRequest {
    AddPlaceRequest {
        name: name.to_string(),
        image: ImageUpload::Bytes(png_bytes()),
        note: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn sample_details(description: &str, tags: &[&str]) -> DetailedResolution {
    DetailedResolution {
        description: description.to_string(),
        latitude: -13.5319,
        longitude: -71.9675,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        detailed_info: DetailedPlaceInfo {
            why_famous: "Historic capital of the Inca Empire".to_string(),
            things_to_do: vec![
                "Walk the Plaza de Armas".to_string(),
                "Visit Qorikancha".to_string(),
                "Eat at San Pedro Market".to_string(),
            ],
            nearby_attractions: vec![
                "Sacsayhuamán".to_string(),
                "Sacred Valley".to_string(),
            ],
            best_time_to_visit: "May to September".to_string(),
            estimated_budget: "$50-80 USD per day".to_string(),
            flights_info: "CUZ - Alejandro Velasco Astete International".to_string(),
        },
    }
}

/// A place already settled with details, for seeding stores directly
pub fn seeded_place(name: &str, tags: &[&str]) -> Place {
    let mut place = Place::new_pending(
        name,
        "data:image/png;base64,iVBORw0KGgo=",
        None,
        tags.iter().map(|t| t.to_string()),
    );
    let details = sample_details(&format!("{} description", name), &[]);
    place.settle_enriched(
        details.description,
        details.detailed_info,
        wishlist_ai::models::Coordinates::new(details.latitude, details.longitude),
        details.tags,
    );
    place
}

/// Workflow over `store` with the given scripted resolver
pub fn test_workflow(store: PlaceStore, resolver: Arc<MockResolver>) -> EnrichmentWorkflow {
    EnrichmentWorkflow::new(store.into_shared(), resolver)
}

/// Poll until the place's detail fetch has settled (or it is gone)
pub async fn wait_until_settled(store: &SharedStore, place_id: Uuid) {
    for _ in 0..200 {
        let settled = store
            .read()
            .await
            .find_place(place_id)
            .map_or(true, |p| !p.is_fetching_details());
        if settled {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("place {} never settled", place_id);
}
