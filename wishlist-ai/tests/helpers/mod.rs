//! Test Helper Utilities
//!
//! Shared utilities for testing wishlist-ai

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_resolver;

pub use fixtures::{
    add_request, png_bytes, sample_details, seeded_place, test_workflow, wait_until_settled,
};
pub use mock_resolver::MockResolver;
