//! Error types shared by the neo-sampler crates.

use thiserror::Error;

/// Result type alias using NeoError.
pub type NeoResult<T> = Result<T, NeoError>;

/// Primary error type for inputs that are invalid regardless of dataset.
#[derive(Debug, Error)]
pub enum NeoError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("Invalid coordinate for '{field}': {value}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),
}
