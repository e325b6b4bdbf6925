//! Place store
//!
//! Owns the country collection and the custom tag vocabulary. Every mutation
//! is applied in memory first and then written through to the key-value
//! backend. A failed write never rolls back: memory stays the source of
//! truth for the session and the failure becomes a standing advisory.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wishlist_common::events::{EventBus, WishlistEvent};

use super::persistence::{KeyValueStore, MemoryKeyValueStore};
use crate::error::{AddPlaceError, StoreError};
use crate::filter;
use crate::models::{Coordinates, Country, Place};
use crate::services::DetailedResolution;

/// Storage key of the country collection
pub const COUNTRIES_KEY: &str = "travelWishlist";

/// Storage key of the custom tag list
pub const CUSTOM_TAGS_KEY: &str = "customTravelTags";

/// Store handle shared between the workflow, background tasks and handlers
pub type SharedStore = Arc<RwLock<PlaceStore>>;

/// Apply `mutation` to the shared store on the blocking pool
///
/// Mutations serialize and write the wishlist while holding the write lock,
/// so async callers go through here instead of `store.write().await`.
pub async fn mutate<T, F>(store: &SharedStore, mutation: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut PlaceStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || mutation(&mut store.blocking_write()))
        .await
        .map_err(|e| StoreError::TaskFailed(format!("Store task panicked: {}", e)))
}

/// Outcome of a detail fetch, posted back to the store
#[derive(Debug, Clone)]
pub enum DetailResult {
    Success(DetailedResolution),
    Failure { reason: String },
}

/// Read-only view of the store
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSnapshot {
    pub countries: Vec<Country>,
    /// All places flattened in country then insertion order
    pub places: Vec<Place>,
}

pub struct PlaceStore {
    countries: Vec<Country>,
    custom_tags: Vec<String>,
    storage: Arc<dyn KeyValueStore>,
    event_bus: Option<EventBus>,
    advisory: Option<StoreError>,
}

impl PlaceStore {
    /// Restore the store from `storage`
    ///
    /// Missing keys mean empty collections. Unreadable or malformed payloads
    /// are treated as empty too and returned as recoverable errors; the last
    /// one also becomes the standing advisory.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> (Self, Vec<StoreError>) {
        let mut errors = Vec::new();

        let mut countries: Vec<Country> =
            load_json(storage.as_ref(), COUNTRIES_KEY, &mut errors).unwrap_or_default();
        countries.retain(|c| !c.places.is_empty());
        countries.sort_by(|a, b| a.cmp_by_name(b));

        let mut custom_tags: Vec<String> = Vec::new();
        for tag in load_json::<Vec<String>>(storage.as_ref(), CUSTOM_TAGS_KEY, &mut errors)
            .unwrap_or_default()
        {
            if !custom_tags.contains(&tag) {
                custom_tags.push(tag);
            }
        }

        let place_count: usize = countries.iter().map(|c| c.places.len()).sum();
        info!(
            countries = countries.len(),
            places = place_count,
            custom_tags = custom_tags.len(),
            "Wishlist restored"
        );

        let store = Self {
            countries,
            custom_tags,
            storage,
            event_bus: None,
            advisory: errors.last().cloned(),
        };
        (store, errors)
    }

    /// Empty store backed by process memory
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryKeyValueStore::new())).0
    }

    /// Publish mutations on `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Countries sorted by name, each with at least one place
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.countries.iter().flat_map(|c| c.places.iter())
    }

    pub fn snapshot(&self) -> PlaceSnapshot {
        PlaceSnapshot {
            countries: self.countries.clone(),
            places: self.places().cloned().collect(),
        }
    }

    pub fn find_place(&self, place_id: Uuid) -> Option<&Place> {
        self.places().find(|p| p.id == place_id)
    }

    /// A place can be opened in the detail view once its details settled
    pub fn selectable_place(&self, place_id: Uuid) -> Option<&Place> {
        self.find_place(place_id)
            .filter(|p| !p.is_fetching_details())
    }

    /// Case-insensitive duplicate check across the whole store
    pub fn contains_place_named(&self, name: &str) -> bool {
        self.places().any(|p| p.is_named(name))
    }

    /// Custom tags in the order they were added
    pub fn custom_tags(&self) -> &[String] {
        &self.custom_tags
    }

    pub fn all_tags(&self) -> Vec<String> {
        filter::all_tags(&self.countries, &self.custom_tags)
    }

    /// Most recent persistence problem, if any
    pub fn advisory(&self) -> Option<&StoreError> {
        self.advisory.as_ref()
    }

    pub fn clear_advisory(&mut self) {
        self.advisory = None;
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Insert `place` under `country_name`, creating the country if needed
    ///
    /// The duplicate check is repeated here so two adds of the same name
    /// racing through basic resolution cannot both land.
    pub fn add_place(
        &mut self,
        country_name: &str,
        country_code: &str,
        place: Place,
    ) -> Result<(), AddPlaceError> {
        if self.contains_place_named(&place.name) {
            return Err(AddPlaceError::DuplicatePlace(place.name));
        }

        let place_id = place.id;
        let place_name = place.name.clone();

        match self.countries.iter_mut().find(|c| c.name == country_name) {
            Some(country) => country.places.push(place),
            None => {
                let mut country = Country::new(country_name, country_code);
                country.places.push(place);
                self.countries.push(country);
                self.countries.sort_by(|a, b| a.cmp_by_name(b));
                debug!(country = %country_name, "Country created");
            }
        }

        info!(place_id = %place_id, place = %place_name, country = %country_name, "Place added");
        self.persist_countries();
        self.emit(WishlistEvent::PlaceAdded {
            place_id,
            place_name,
            country_name: country_name.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Remove a place, dropping its country when it becomes empty
    ///
    /// Returns the removed place; unknown ids are a no-op.
    pub fn remove_place(&mut self, place_id: Uuid) -> Option<Place> {
        let country_index = self
            .countries
            .iter()
            .position(|c| c.places.iter().any(|p| p.id == place_id))?;

        let country = &mut self.countries[country_index];
        let place_index = country.places.iter().position(|p| p.id == place_id)?;
        let removed = country.places.remove(place_index);

        let country_removed = country.places.is_empty();
        if country_removed {
            let country = self.countries.remove(country_index);
            debug!(country = %country.name, "Country removed with its last place");
        }

        info!(place_id = %place_id, place = %removed.name, "Place removed");
        self.persist_countries();
        self.emit(WishlistEvent::PlaceRemoved {
            place_id,
            country_removed,
            timestamp: Utc::now(),
        });
        Some(removed)
    }

    /// Flip the visited flag; returns the new value
    pub fn toggle_visited(&mut self, place_id: Uuid) -> Option<bool> {
        let place = self.place_mut(place_id)?;
        place.visited = !place.visited;
        let visited = place.visited;

        self.place_updated(place_id);
        Some(visited)
    }

    /// Replace the tag set; returns `false` for unknown ids
    pub fn update_tags(&mut self, place_id: Uuid, tags: Vec<String>) -> bool {
        let Some(place) = self.place_mut(place_id) else {
            return false;
        };
        place.set_tags(tags);

        self.place_updated(place_id);
        true
    }

    /// Add `tag` if absent, remove it if present
    pub fn toggle_tag(&mut self, place_id: Uuid, tag: &str) -> bool {
        let Some(place) = self.place_mut(place_id) else {
            return false;
        };
        place.toggle_tag(tag);

        self.place_updated(place_id);
        true
    }

    /// Settle a place's background detail fetch
    ///
    /// A no-op (returning `false`) if the place was deleted meanwhile or has
    /// already settled.
    pub fn reconcile_details(&mut self, place_id: Uuid, result: DetailResult) -> bool {
        let Some(place) = self.place_mut(place_id) else {
            debug!(place_id = %place_id, "Detail result for a removed place ignored");
            return false;
        };

        let event = match result {
            DetailResult::Success(details) => {
                let coordinates = Coordinates::new(details.latitude, details.longitude);
                if coordinates.is_none() {
                    warn!(
                        place_id = %place_id,
                        latitude = details.latitude,
                        longitude = details.longitude,
                        "Dropping out-of-range coordinates"
                    );
                }
                if !place.settle_enriched(
                    details.description,
                    details.detailed_info,
                    coordinates,
                    details.tags,
                ) {
                    return false;
                }
                WishlistEvent::PlaceEnriched {
                    place_id,
                    timestamp: Utc::now(),
                }
            }
            DetailResult::Failure { reason } => {
                if !place.settle_failed(reason.clone()) {
                    return false;
                }
                WishlistEvent::PlaceEnrichmentFailed {
                    place_id,
                    reason,
                    timestamp: Utc::now(),
                }
            }
        };

        self.persist_countries();
        self.emit(event);
        true
    }

    /// Add a reusable tag to the vocabulary
    ///
    /// Blank tags and tags already known (custom or on any place) are
    /// rejected with `false`.
    pub fn add_custom_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.all_tags().iter().any(|t| t == tag) {
            return false;
        }

        self.custom_tags.push(tag.to_string());
        info!(tag = %tag, "Custom tag added");

        self.persist_custom_tags();
        self.emit(WishlistEvent::CustomTagAdded {
            tag: tag.to_string(),
            timestamp: Utc::now(),
        });
        true
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn place_mut(&mut self, place_id: Uuid) -> Option<&mut Place> {
        self.countries
            .iter_mut()
            .flat_map(|c| c.places.iter_mut())
            .find(|p| p.id == place_id)
    }

    fn place_updated(&mut self, place_id: Uuid) {
        self.persist_countries();
        self.emit(WishlistEvent::PlaceUpdated {
            place_id,
            timestamp: Utc::now(),
        });
    }

    fn persist_countries(&mut self) {
        let countries = std::mem::take(&mut self.countries);
        self.persist(COUNTRIES_KEY, &countries);
        self.countries = countries;
    }

    fn persist_custom_tags(&mut self) {
        let custom_tags = std::mem::take(&mut self.custom_tags);
        self.persist(CUSTOM_TAGS_KEY, &custom_tags);
        self.custom_tags = custom_tags;
    }

    /// Write `value` under `key`; failures become the standing advisory
    fn persist<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| e.to_string())
            .and_then(|json| self.storage.set(key, &json).map_err(|e| e.to_string()));

        if let Err(message) = result {
            let error = StoreError::PersistenceWrite {
                key: key.to_string(),
                message,
            };
            warn!(key = %key, error = %error, "Persistence write failed");
            self.emit(WishlistEvent::PersistenceAdvisory {
                message: error.to_string(),
                timestamp: Utc::now(),
            });
            self.advisory = Some(error);
        }
    }

    fn emit(&self, event: WishlistEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
    errors: &mut Vec<StoreError>,
) -> Option<T> {
    let read_error = |message: String| StoreError::PersistenceRead {
        key: key.to_string(),
        message,
    };

    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            let error = read_error(e.to_string());
            warn!(key = %key, error = %error, "Persisted data unreadable, starting empty");
            errors.push(error);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            let error = read_error(e.to_string());
            warn!(key = %key, error = %error, "Persisted data malformed, starting empty");
            errors.push(error);
            None
        }
    }
}
