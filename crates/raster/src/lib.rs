//! Raster access for indexed-palette global imagery.
//!
//! - [`png`]: minimal PNG container reader (chunks, header, palette)
//! - [`source`]: where raster bytes come from (HTTP, local mirror)
//! - [`sampler`]: one decoded raster answering color-at-coordinate queries
//! - [`palette`]: reverse lookup from sampled color to palette index

pub mod error;
pub mod palette;
pub mod png;
pub mod sampler;
pub mod source;

pub use error::{RasterError, Result};
pub use palette::{build_reverse_palette, ReversePalette, UNKNOWN_PALETTE_INDEX};
pub use png::{Palette, PngHeader};
pub use sampler::RasterSampler;
pub use source::{is_local, FileImageSource, HttpImageSource, ImageSource};
