//! Place model
//!
//! In memory a place carries its enrichment state as an explicit
//! [`PlaceEnrichment`] variant, so a place that is still fetching can never
//! expose detail. On the wire (persistence and HTTP) it uses the flat
//! camelCase record the presentation layer reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Placeholder description while detail enrichment is in flight
pub const FETCHING_DESCRIPTION: &str = "Fetching details...";

/// Fixed description once detail enrichment has failed
pub const FAILED_DESCRIPTION: &str = "Could not fetch details.";

/// Travel-guide payload produced by detailed resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedPlaceInfo {
    pub why_famous: String,
    pub things_to_do: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub best_time_to_visit: String,
    pub estimated_budget: String,
    pub flights_info: String,
}

/// Geographic position of a place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` for non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Enrichment state of a place
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceEnrichment {
    /// Detail fetch in flight
    Pending,
    /// Detail fetch succeeded
    Enriched {
        info: DetailedPlaceInfo,
        coordinates: Option<Coordinates>,
    },
    /// Detail fetch failed; detail stays absent for good
    Failed { reason: String },
}

/// A single travel destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PlaceRecord", from = "PlaceRecord")]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub description: String,
    pub visited: bool,
    pub note: Option<String>,
    tags: Vec<String>,
    enrichment: PlaceEnrichment,
}

impl Place {
    /// Create a freshly submitted place awaiting detail enrichment
    pub fn new_pending(
        name: impl Into<String>,
        image_url: impl Into<String>,
        note: Option<String>,
        tags: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image_url: image_url.into(),
            description: FETCHING_DESCRIPTION.to_string(),
            visited: false,
            note: note.filter(|n| !n.trim().is_empty()),
            tags: normalize_tags(tags),
            enrichment: PlaceEnrichment::Pending,
        }
    }

    pub fn is_fetching_details(&self) -> bool {
        matches!(self.enrichment, PlaceEnrichment::Pending)
    }

    pub fn detailed_info(&self) -> Option<&DetailedPlaceInfo> {
        match &self.enrichment {
            PlaceEnrichment::Enriched { info, .. } => Some(info),
            _ => None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match &self.enrichment {
            PlaceEnrichment::Enriched { coordinates, .. } => *coordinates,
            _ => None,
        }
    }

    /// Sorted, deduplicated tag list
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }

    /// Case-insensitive name comparison used for duplicate detection
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = String>) {
        self.tags = normalize_tags(tags);
    }

    /// Add the tag if absent, remove it if present
    pub fn toggle_tag(&mut self, tag: &str) {
        match self.tags.binary_search_by(|t| t.as_str().cmp(tag)) {
            Ok(index) => {
                self.tags.remove(index);
            }
            Err(index) => self.tags.insert(index, tag.to_string()),
        }
    }

    /// Settle a pending place with enriched detail
    ///
    /// Suggested tags are unioned with the existing ones. Returns `false`
    /// (and changes nothing) if the place was already settled.
    pub fn settle_enriched(
        &mut self,
        description: String,
        info: DetailedPlaceInfo,
        coordinates: Option<Coordinates>,
        suggested_tags: impl IntoIterator<Item = String>,
    ) -> bool {
        if !self.is_fetching_details() {
            return false;
        }
        self.description = description;
        self.tags = normalize_tags(self.tags.drain(..).chain(suggested_tags));
        self.enrichment = PlaceEnrichment::Enriched { info, coordinates };
        true
    }

    /// Settle a pending place as failed. Returns `false` if already settled.
    pub fn settle_failed(&mut self, reason: impl Into<String>) -> bool {
        if !self.is_fetching_details() {
            return false;
        }
        self.description = FAILED_DESCRIPTION.to_string();
        self.enrichment = PlaceEnrichment::Failed {
            reason: reason.into(),
        };
        true
    }
}

/// Sort and deduplicate a tag collection (case-sensitive)
pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    tags.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Flat wire form of a [`Place`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub description: String,
    #[serde(default)]
    pub visited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_info: Option<DetailedPlaceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_fetching_details: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

impl From<Place> for PlaceRecord {
    fn from(place: Place) -> Self {
        let is_fetching_details = place.is_fetching_details();
        let (detailed_info, coordinates, enrichment_error) = match place.enrichment {
            PlaceEnrichment::Pending => (None, None, None),
            PlaceEnrichment::Enriched { info, coordinates } => (Some(info), coordinates, None),
            PlaceEnrichment::Failed { reason } => (None, None, Some(reason)),
        };

        Self {
            id: place.id,
            name: place.name,
            image_url: place.image_url,
            description: place.description,
            visited: place.visited,
            note: place.note,
            tags: place.tags,
            detailed_info,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            is_fetching_details,
            enrichment_error,
        }
    }
}

impl From<PlaceRecord> for Place {
    /// Restores a persisted record
    ///
    /// A record still marked as fetching cannot have a live detail fetch
    /// behind it any more, so it comes back as failed.
    fn from(record: PlaceRecord) -> Self {
        let (description, enrichment) = match record.detailed_info {
            Some(info) => {
                let coordinates = match (record.latitude, record.longitude) {
                    (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
                    _ => None,
                };
                (
                    record.description,
                    PlaceEnrichment::Enriched { info, coordinates },
                )
            }
            None if record.is_fetching_details => (
                FAILED_DESCRIPTION.to_string(),
                PlaceEnrichment::Failed {
                    reason: "interrupted before details arrived".to_string(),
                },
            ),
            None => {
                let reason = record
                    .enrichment_error
                    .unwrap_or_else(|| record.description.clone());
                (record.description, PlaceEnrichment::Failed { reason })
            }
        };

        Self {
            id: record.id,
            name: record.name,
            image_url: record.image_url,
            description,
            visited: record.visited,
            note: record.note.filter(|n| !n.trim().is_empty()),
            tags: normalize_tags(record.tags),
            enrichment,
        }
    }
}
