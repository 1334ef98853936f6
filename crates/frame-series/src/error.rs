//! Run-level errors.
//!
//! Only failures that make the whole run meaningless surface here. A frame
//! that cannot be fetched or sampled is logged and left out of the frame set.

use datasets::DatasetError;
use raster::RasterError;
use thiserror::Error;

/// The host rejected a push.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors that abort an orchestration run.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The reference raster could not be turned into a reverse palette.
    #[error("palette unavailable: {0}")]
    Palette(#[source] RasterError),

    /// The dataset or its catalog could not be resolved.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Invalid orchestrator configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Pushing results to the host failed.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
