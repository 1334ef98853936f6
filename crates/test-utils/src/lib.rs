//! Shared test utilities for the neo-sampler workspace.
//!
//! This crate provides common testing infrastructure including:
//! - PNG generators for synthetic indexed and truecolor rasters
//! - An in-memory [`raster::ImageSource`] with failure and latency injection
//! - Catalog and pin fixtures
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Crates that `test-utils` itself depends on (`raster`) should only use the
//! byte-level generators from their unit tests; anything involving their own
//! types belongs in `tests/`.

pub mod fixtures;
pub mod generators;
pub mod source;

pub use fixtures::*;
pub use generators::*;
pub use source::MemoryImageSource;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
