//! Error types for dataset lookup and catalog loading.

use thiserror::Error;

/// Errors raised while resolving a dataset or its catalog.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// No supported dataset has this id.
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    /// The catalog document could not be read or parsed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The catalog lists no images for the dataset.
    #[error("catalog has no images for dataset {0}")]
    EmptyCatalog(String),
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Catalog(err.to_string())
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Catalog(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
