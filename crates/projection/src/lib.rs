//! Coordinate projections from geographic coordinates to raster pixels.
//!
//! Only the global equirectangular (plate carrée) layout is supported: the
//! image spans longitude -180..180 left to right and latitude 90..-90 top to
//! bottom.

pub mod equirectangular;

pub use equirectangular::{lat_long_to_pixel, PixelCoord};

/// Longitude range covered by a global raster.
pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;
pub const LONGITUDE_RANGE: f64 = LONGITUDE_MAX - LONGITUDE_MIN;

/// Latitude range covered by a global raster.
pub const LATITUDE_MIN: f64 = -90.0;
pub const LATITUDE_MAX: f64 = 90.0;
pub const LATITUDE_RANGE: f64 = LATITUDE_MAX - LATITUDE_MIN;
