//! Common test fixtures for neo-sampler tests.
//!
//! Pre-defined pins, dates and catalog documents shaped like what the image
//! service returns.

use neo_common::SamplePoint;
use serde_json::{json, Value};

/// Named sample locations.
pub mod points {
    /// Near Boston, used by the demo pin.
    pub const DEMO: (f64, f64) = (42.3555, -73.0);

    /// Null Island.
    pub const ORIGIN: (f64, f64) = (0.0, 0.0);

    pub const NORTH_POLE: (f64, f64) = (90.0, 0.0);

    pub const SOUTH_POLE: (f64, f64) = (-90.0, 0.0);

    /// Exactly on the antimeridian, eastern side.
    pub const DATELINE: (f64, f64) = (0.0, 180.0);
}

/// Monthly catalog dates.
pub mod dates {
    pub const JAN_2001: &str = "2001-01-01";
    pub const FEB_2001: &str = "2001-02-01";
    pub const MAR_2001: &str = "2001-03-01";

    /// Three consecutive months, deliberately out of order.
    pub const SHUFFLED_Q1_2001: [&str; 3] = [MAR_2001, JAN_2001, FEB_2001];
}

/// The standard red-pin demo point.
pub fn demo_point() -> SamplePoint {
    SamplePoint::new("pin-1", points::DEMO.0, points::DEMO.1, "#ff0000")
}

/// A point at `(latitude, longitude)` with a generated id.
pub fn point(id: &str, latitude: f64, longitude: f64) -> SamplePoint {
    SamplePoint::new(id, latitude, longitude, "#0000ff")
}

/// A catalog document listing `dates` for `dataset_id`.
pub fn catalog_json(dataset_id: &str, dates: &[&str], max_resolution: Option<(u32, u32)>) -> Value {
    let images: Vec<Value> = dates
        .iter()
        .map(|date| json!({ "date": date, "id": dataset_id }))
        .collect();
    let mut doc = json!({ "images": images });
    if let Some((width, height)) = max_resolution {
        doc["maxResolution"] = json!({ "width": width, "height": height });
    }
    doc
}

/// A catalog document for monthly frames starting in January 2001.
pub fn monthly_catalog_json(dataset_id: &str, months: usize) -> Value {
    let dates: Vec<String> = (0..months)
        .map(|m| format!("{:04}-{:02}-01", 2001 + m / 12, m % 12 + 1))
        .collect();
    let refs: Vec<&str> = dates.iter().map(String::as_str).collect();
    catalog_json(dataset_id, &refs, None)
}

/// Pins as the host would deliver them, including two unusable records.
pub fn raw_pins_json() -> Value {
    json!([
        { "id": "a", "pinLat": 42.3555, "pinLong": -73, "pinColor": "#ff0000" },
        { "id": "b", "pinLat": "10.5", "pinLong": "20.25" },
        { "id": "c", "pinLat": "north", "pinLong": 3 },
        { "id": "d", "pinLat": null, "pinLong": 3 }
    ])
}
