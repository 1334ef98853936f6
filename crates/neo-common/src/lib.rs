//! Common types and utilities shared across the neo-sampler crates.

pub mod color;
pub mod error;
pub mod pin;
pub mod time;

pub use color::Rgb;
pub use error::{NeoError, NeoResult};
pub use pin::{RawPin, SamplePoint};
pub use time::{coerce_cursor, cursor_timestamp, parse_catalog_date, DAY_IN_SECONDS};
