//! HTTP API handlers for wishlist-ai
//!
//! JSON endpoints standing in for the grid, map and detail views, plus
//! health and an SSE event stream.

pub mod health;
pub mod places;
pub mod sse;
pub mod tags;

pub use health::health_routes;
pub use places::place_routes;
pub use sse::event_stream;
pub use tags::tag_routes;
