//! Wishlist data model

pub mod country;
pub mod place;

pub use country::{flag_url, Country};
pub use place::{
    normalize_tags, Coordinates, DetailedPlaceInfo, Place, PlaceEnrichment, PlaceRecord,
    FAILED_DESCRIPTION, FETCHING_DESCRIPTION,
};
