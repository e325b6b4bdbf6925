//! Filter engine
//!
//! Pure derivations of the visible wishlist from store state plus a search
//! term and a selected tag. Nothing is cached between calls.

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::models::{Country, Place};

/// Search term and tag selection
///
/// Deserializes from the `?search=&tag=` query string. Empty strings mean
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, rename = "search")]
    pub search_term: String,
    #[serde(default, rename = "tag")]
    pub selected_tag: String,
}

impl FilterCriteria {
    pub fn new(search_term: impl Into<String>, selected_tag: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            selected_tag: selected_tag.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.selected_tag.is_empty()
    }

    /// Name contains the search term (case-insensitive) and the tag set
    /// contains the selected tag (exact)
    pub fn matches(&self, place: &Place) -> bool {
        let name_matches = self.search_term.is_empty()
            || place
                .name
                .to_lowercase()
                .contains(&self.search_term.to_lowercase());
        let tag_matches = self.selected_tag.is_empty() || place.has_tag(&self.selected_tag);
        name_matches && tag_matches
    }
}

/// Flat list of passing places, in country then insertion order
pub fn filter_places(countries: &[Country], criteria: &FilterCriteria) -> Vec<Place> {
    countries
        .iter()
        .flat_map(|c| c.places.iter())
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect()
}

/// Countries narrowed to their passing places; empty ones are omitted
pub fn filter_countries(countries: &[Country], criteria: &FilterCriteria) -> Vec<Country> {
    countries
        .iter()
        .filter_map(|country| {
            let places: Vec<Place> = country
                .places
                .iter()
                .filter(|p| criteria.matches(p))
                .cloned()
                .collect();
            (!places.is_empty()).then(|| Country {
                name: country.name.clone(),
                flag_url: country.flag_url.clone(),
                places,
            })
        })
        .collect()
}

/// Passing places that can be pinned on a map
pub fn mappable_places(countries: &[Country], criteria: &FilterCriteria) -> Vec<Place> {
    filter_places(countries, criteria)
        .into_iter()
        .filter(|p| p.coordinates().is_some())
        .collect()
}

/// Full tag vocabulary: every place tag plus the custom tags, sorted
pub fn all_tags(countries: &[Country], custom_tags: &[String]) -> Vec<String> {
    countries
        .iter()
        .flat_map(|c| c.places.iter())
        .flat_map(|p| p.tags().iter())
        .chain(custom_tags.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
