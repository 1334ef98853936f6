//! Pre-scraped image catalogs.
//!
//! The catalog file is produced offline and maps each dataset id to the
//! images available for it:
//!
//! ```json
//! { "GPM_3IMERGM": { "images": [{ "date": "2001-01-01", "id": "1234" }],
//!                    "maxResolution": { "width": 3600, "height": 1800 } } }
//! ```
//!
//! Image order is whatever the scrape produced and is not chronological.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use neo_common::parse_catalog_date;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DatasetError, Result};

/// Raster size requested from the image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Size used unless a dataset cannot render that large.
pub const DEFAULT_RESOLUTION: Resolution = Resolution { width: 720, height: 360 };

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The default resolution, or `max` when it is smaller in either
    /// dimension. A zero-sized `max` is treated as unknown.
    pub fn effective(max: Resolution) -> Resolution {
        if max.width == 0 || max.height == 0 {
            return DEFAULT_RESOLUTION;
        }
        if max.width < DEFAULT_RESOLUTION.width || max.height < DEFAULT_RESOLUTION.height {
            max
        } else {
            DEFAULT_RESOLUTION
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        DEFAULT_RESOLUTION
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One scraped image record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub date: String,
    /// Remote image id understood by the render servlet.
    pub id: String,
}

/// A parsed catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub date: NaiveDate,
    pub remote_id: String,
}

/// Scraped listing for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetCatalog {
    pub images: Vec<ImageInfo>,
    #[serde(rename = "maxResolution", default)]
    pub max_resolution: Resolution,
}

impl DatasetCatalog {
    /// Resolution frames of this dataset are requested at.
    pub fn resolution(&self) -> Resolution {
        Resolution::effective(self.max_resolution)
    }

    /// Parsed entries in catalog order.
    ///
    /// Records with an unparseable date are skipped with a warning.
    ///
    /// # Errors
    /// [`DatasetError::EmptyCatalog`] when no usable entry remains.
    pub fn entries(&self, dataset_id: &str) -> Result<Vec<CatalogEntry>> {
        let entries: Vec<CatalogEntry> = self
            .images
            .iter()
            .filter_map(|image| match parse_catalog_date(&image.date) {
                Ok(date) => Some(CatalogEntry {
                    date,
                    remote_id: image.id.clone(),
                }),
                Err(e) => {
                    warn!(dataset = dataset_id, date = %image.date, error = %e, "Skipping catalog image");
                    None
                }
            })
            .collect();

        if entries.is_empty() {
            return Err(DatasetError::EmptyCatalog(dataset_id.to_string()));
        }
        Ok(entries)
    }
}

/// Scraped listings for every dataset, keyed by dataset id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    datasets: HashMap<String, DatasetCatalog>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, dataset_id: impl Into<String>, catalog: DatasetCatalog) {
        self.datasets.insert(dataset_id.into(), catalog);
    }

    /// Listing for `dataset_id`.
    pub fn dataset(&self, dataset_id: &str) -> Result<&DatasetCatalog> {
        self.datasets
            .get(dataset_id)
            .ok_or_else(|| DatasetError::Catalog(format!("no catalog for dataset {}", dataset_id)))
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{catalog_json, dates};

    #[test]
    fn test_effective_resolution() {
        assert_eq!(Resolution::effective(Resolution::new(3600, 1800)), DEFAULT_RESOLUTION);
        assert_eq!(Resolution::effective(Resolution::new(720, 360)), DEFAULT_RESOLUTION);
        assert_eq!(Resolution::effective(Resolution::new(360, 180)), Resolution::new(360, 180));
        // Smaller in one dimension is enough.
        assert_eq!(Resolution::effective(Resolution::new(1440, 300)), Resolution::new(1440, 300));
        assert_eq!(Resolution::effective(Resolution::new(0, 0)), DEFAULT_RESOLUTION);
    }

    #[test]
    fn test_resolution_string() {
        assert_eq!(DEFAULT_RESOLUTION.to_string(), "720x360");
    }

    #[test]
    fn test_entries_keep_catalog_order() {
        let doc = catalog_json("X", &dates::SHUFFLED_Q1_2001, Some((3600, 1800)));
        let listing: DatasetCatalog = serde_json::from_value(doc).unwrap();
        let entries = listing.entries("X").unwrap();
        let got: Vec<String> = entries.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(got, vec!["2001-03-01", "2001-01-01", "2001-02-01"]);
        assert_eq!(entries[0].remote_id, "X");
    }

    #[test]
    fn test_bad_dates_skipped_and_empty_rejected() {
        let listing = DatasetCatalog {
            images: vec![ImageInfo {
                date: "sometime".into(),
                id: "1".into(),
            }],
            max_resolution: DEFAULT_RESOLUTION,
        };
        assert!(matches!(listing.entries("X"), Err(DatasetError::EmptyCatalog(_))));
    }

    #[test]
    fn test_missing_max_resolution_defaults() {
        let listing: DatasetCatalog = serde_json::from_str(r#"{"images": []}"#).unwrap();
        assert_eq!(listing.resolution(), DEFAULT_RESOLUTION);
    }

    #[test]
    fn test_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neo-dataset-images.json");
        let doc = serde_json::json!({ "MOP_CO_M": catalog_json("MOP_CO_M", &[dates::JAN_2001], Some((360, 180))) });
        std::fs::write(&path, doc.to_string()).unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.dataset("MOP_CO_M").unwrap().resolution(), Resolution::new(360, 180));
        assert!(matches!(catalog.dataset("AURA_NO2_M"), Err(DatasetError::Catalog(_))));
        assert!(Catalog::from_path(dir.path().join("missing.json")).is_err());
    }
}
