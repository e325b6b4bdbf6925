//! Common error types for the travel wishlist crates

use thiserror::Error;

/// Common result type for wishlist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across wishlist crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
