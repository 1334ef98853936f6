//! Palette index to physical value.
//!
//! Every dataset maps the 8-bit palette index of its rasters onto a physical
//! quantity. Two curve shapes cover the supported datasets:
//!
//! | Shape | Value |
//! |-------|-------|
//! | Exponential | `a * e^(b * index)` |
//! | Linear | `index / 255 * range + offset` |
//!
//! Index 255 is the "no data" fill (land/ocean mask) in every NEO palette,
//! and `-1` is what the reverse palette returns for a color it does not know.
//! Both yield `None`, which is distinct from a genuine zero reading.

use serde::Serialize;

/// Palette index the rasters use for "no data".
pub const NO_DATA_INDEX: i32 = 255;

/// Highest index that carries a measurement.
const LAST_VALID_INDEX: i32 = NO_DATA_INDEX - 1;

/// Curve shape of a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Curve {
    /// `a * e^(b * index)`.
    Exponential { a: f64, b: f64 },
    /// `index / 255 * range + offset`.
    Linear { range: f64, offset: f64 },
}

impl Curve {
    /// Exponential curve passing through `first` at index 0 and `last` at
    /// the last valid index.
    pub fn exponential_between(first: f64, last: f64) -> Self {
        Curve::Exponential {
            a: first,
            b: (last / first).ln() / LAST_VALID_INDEX as f64,
        }
    }

    #[inline]
    fn eval(&self, index: i32) -> f64 {
        let i = index as f64;
        match *self {
            Curve::Exponential { a, b } => a * (b * i).exp(),
            Curve::Linear { range, offset } => i / 255.0 * range + offset,
        }
    }
}

/// A dataset's calibration: a curve plus the index range it is defined on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pub curve: Curve,
    /// Physical unit of the result, for display.
    pub unit: &'static str,
    pub first_valid: i32,
    pub last_valid: i32,
}

impl Calibration {
    pub const fn new(curve: Curve, unit: &'static str) -> Self {
        Self {
            curve,
            unit,
            first_valid: 0,
            last_valid: LAST_VALID_INDEX,
        }
    }

    /// Physical value for a palette index, or `None` for no-data and
    /// out-of-range indices.
    pub fn palette_to_value(&self, index: i32) -> Option<f64> {
        if index < self.first_valid || index > self.last_valid {
            return None;
        }
        let value = self.curve.eval(index);
        value.is_finite().then_some(value)
    }
}
