//! Dataset descriptors and their static inputs.
//!
//! - [`registry`]: the fixed set of supported datasets
//! - [`calibration`]: palette index -> physical value per dataset
//! - [`catalog`]: pre-scraped image listings and effective resolution
//! - [`url`]: raster URL construction for the render servlet or the mirror

pub mod calibration;
pub mod catalog;
pub mod error;
pub mod registry;
pub mod url;

pub use calibration::{Calibration, Curve, NO_DATA_INDEX};
pub use catalog::{Catalog, CatalogEntry, DatasetCatalog, ImageInfo, Resolution, DEFAULT_RESOLUTION};
pub use error::{DatasetError, Result};
pub use registry::{all_datasets, default_dataset, find_dataset, Dataset};
pub use url::{UrlMode, NEO_RENDER_URL, S3_MIRROR_URL};
