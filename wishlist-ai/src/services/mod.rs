//! External collaborators: AI lookups and image encoding

pub mod gemini_client;
pub mod image_encoder;
pub mod resolver;

pub use gemini_client::GeminiClient;
pub use image_encoder::{encode_data_uri, ImageError, ImageUpload};
pub use resolver::{BasicResolution, DetailedResolution, PlaceResolver, ResolveError};
