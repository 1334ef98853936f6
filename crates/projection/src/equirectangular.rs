//! Equirectangular projection of (lat, long) onto an image grid.

use neo_common::{NeoError, NeoResult};

use crate::{LATITUDE_MAX, LATITUDE_MIN, LATITUDE_RANGE, LONGITUDE_MIN, LONGITUDE_RANGE};

/// Pixel position, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

/// Convert latitude and longitude to the pixel containing them.
///
/// - Longitude is shifted so -180 maps to 0, then wrapped into [0, 360), so
///   any real longitude is accepted.
/// - Latitude is clamped to [-90, 90]; the poles saturate to the first and
///   last row instead of wrapping.
/// - `x = floor(fraction * width)`, `y = floor((1 - fraction) * height)`
///   clamped to `[0, height - 1]`.
///
/// # Errors
/// `InvalidDimensions` when either dimension is zero, `InvalidCoordinate`
/// when a coordinate is NaN or infinite.
pub fn lat_long_to_pixel(width: u32, height: u32, lat: f64, long: f64) -> NeoResult<PixelCoord> {
    if width == 0 || height == 0 {
        return Err(NeoError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    if !lat.is_finite() {
        return Err(NeoError::InvalidCoordinate { field: "latitude", value: lat.to_string() });
    }
    if !long.is_finite() {
        return Err(NeoError::InvalidCoordinate { field: "longitude", value: long.to_string() });
    }

    let normalized_long = (long - LONGITUDE_MIN).rem_euclid(LONGITUDE_RANGE);
    let shifted_lat = lat.clamp(LATITUDE_MIN, LATITUDE_MAX) - LATITUDE_MIN;

    let x_fraction = normalized_long / LONGITUDE_RANGE;
    let y_fraction = shifted_lat / LATITUDE_RANGE;

    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    let x = ((x_fraction * width as f64).floor() as u32).min(width - 1);
    let y = ((1.0 - y_fraction) * height as f64)
        .floor()
        .clamp(0.0, (height - 1) as f64) as u32;

    Ok(PixelCoord { x, y })
}
