//! Error types for raster loading and sampling.

use neo_common::NeoError;
use thiserror::Error;

/// Errors that can occur while fetching, decoding or sampling a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Network failure, empty response, or undecodable image.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// Sampling attempted before a successful load.
    #[error("raster not loaded")]
    NotLoaded,

    /// Sampling attempted after dispose.
    #[error("raster already disposed")]
    Disposed,

    /// The raster has no embedded color table.
    #[error("no palette found in {url}")]
    PaletteMissing { url: String },

    /// The bytes are not a well-formed PNG container.
    #[error("invalid PNG: {0}")]
    InvalidPng(String),

    /// Coordinate could not be projected onto the raster.
    #[error("projection error: {0}")]
    Projection(#[from] NeoError),
}

impl RasterError {
    /// Create a Load error.
    pub fn load(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidPng error.
    pub fn invalid_png(msg: impl Into<String>) -> Self {
        Self::InvalidPng(msg.into())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
