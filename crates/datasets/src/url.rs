//! Raster URL construction.

use std::fmt;
use std::str::FromStr;

use crate::catalog::{CatalogEntry, Resolution};

/// NEO render servlet.
pub const NEO_RENDER_URL: &str = "https://neo.gsfc.nasa.gov/servlet/RenderData";

/// Static mirror of pre-rendered frames.
pub const S3_MIRROR_URL: &str = "https://models-resources.concord.org/neo-images/v1";

/// Where frame rasters are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlMode {
    /// Rendered on demand by NEO, addressed by remote image id. Rate limited.
    Neo { base: String },
    /// Pre-rendered copies addressed by dataset, resolution and date. `base`
    /// may be an HTTP(S) URL, a `file://` URL or a filesystem path.
    Mirror { base: String },
}

impl Default for UrlMode {
    fn default() -> Self {
        UrlMode::mirror()
    }
}

impl UrlMode {
    pub fn neo() -> Self {
        UrlMode::Neo {
            base: NEO_RENDER_URL.to_string(),
        }
    }

    pub fn mirror() -> Self {
        UrlMode::Mirror {
            base: S3_MIRROR_URL.to_string(),
        }
    }

    /// Replace the base URL, keeping the mode.
    pub fn with_base(self, base: impl Into<String>) -> Self {
        let base = base.into();
        match self {
            UrlMode::Neo { .. } => UrlMode::Neo { base },
            UrlMode::Mirror { .. } => UrlMode::Mirror { base },
        }
    }

    pub fn base(&self) -> &str {
        match self {
            UrlMode::Neo { base } | UrlMode::Mirror { base } => base,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UrlMode::Neo { .. } => "neo",
            UrlMode::Mirror { .. } => "mirror",
        }
    }

    /// URL of the raster for one catalog entry.
    pub fn frame_url(&self, dataset_id: &str, entry: &CatalogEntry, resolution: Resolution) -> String {
        match self {
            UrlMode::Neo { base } => format!(
                "{}?si={}&cs=rgb&format=PNG&width={}&height={}",
                base, entry.remote_id, resolution.width, resolution.height
            ),
            UrlMode::Mirror { base } => format!(
                "{}/{}/{}/{}.png",
                base.trim_end_matches('/'),
                dataset_id,
                resolution,
                entry.date.format("%Y-%m-%d")
            ),
        }
    }
}

impl fmt::Display for UrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.base())
    }
}

impl FromStr for UrlMode {
    type Err = String;

    /// Parse a mode name with its default base.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neo" | "render" => Ok(UrlMode::neo()),
            "mirror" | "s3" => Ok(UrlMode::mirror()),
            other => Err(format!("unknown image source '{}', expected neo or mirror", other)),
        }
    }
}
