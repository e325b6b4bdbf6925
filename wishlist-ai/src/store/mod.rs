//! Wishlist state and its persistence

pub mod persistence;
pub mod place_store;

pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use place_store::{
    mutate, DetailResult, PlaceSnapshot, PlaceStore, SharedStore, COUNTRIES_KEY, CUSTOM_TAGS_KEY,
};
