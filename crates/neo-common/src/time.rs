//! Time cursor conversions.
//!
//! The shared time cursor is expressed in seconds since the Unix epoch of the
//! first day of a frame's month, plus one day. The extra day keeps hosts that
//! render the value in a timezone west of UTC from showing the previous month.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::error::{NeoError, NeoResult};
use crate::pin::numeric_value;

pub const DAY_IN_SECONDS: i64 = 24 * 60 * 60;

/// Parse a catalog date (`YYYY-MM-DD`).
pub fn parse_catalog_date(s: &str) -> NeoResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| NeoError::InvalidDate(s.to_string()))
}

/// Time cursor value for a frame date.
pub fn cursor_timestamp(date: NaiveDate) -> i64 {
    let month_start = date.with_day(1).unwrap_or(date);
    let midnight = month_start.and_hms_opt(0, 0, 0).unwrap_or_default();
    midnight.and_utc().timestamp() + DAY_IN_SECONDS
}

/// Coerce an inbound `globalValue` to a cursor value.
///
/// Returns `None` for anything not number-like.
pub fn coerce_cursor(value: &Value) -> Option<f64> {
    numeric_value(value)
}
