//! # Travel Wishlist Common Library
//!
//! Shared code for the travel wishlist crates including:
//! - Error types
//! - Event types (WishlistEvent enum) and the event bus
//! - Bootstrap configuration loading and folder/credential resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
