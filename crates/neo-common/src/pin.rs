//! Sample points ("pins") placed by the user on the map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A geographic point at which every frame is sampled.
///
/// Latitude outside [-90, 90] is clamped at projection time and longitude is
/// normalized, so neither is rejected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Display color of the pin, `#rrggbb`.
    pub color: String,
    pub label: String,
}

impl SamplePoint {
    /// Create a point labelled by its rounded coordinates.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            color: color.into(),
            label: coordinate_label(latitude, longitude),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// `"{lat}, {long}"` with two decimals each.
pub fn coordinate_label(latitude: f64, longitude: f64) -> String {
    format!("{:.2}, {:.2}", latitude, longitude)
}

/// A pin record as delivered by the point-management collaborator.
///
/// Coordinates arrive number-like: a JSON number, a numeric string, or junk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPin {
    pub id: String,
    #[serde(alias = "pinLat", alias = "lat")]
    pub latitude: Value,
    #[serde(alias = "pinLong", alias = "long", alias = "lon")]
    pub longitude: Value,
    #[serde(default, alias = "pinColor")]
    pub color: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl RawPin {
    /// Convert to a sample point, or `None` when either coordinate is not
    /// numeric.
    pub fn into_sample_point(self) -> Option<SamplePoint> {
        let latitude = numeric_value(&self.latitude)?;
        let longitude = numeric_value(&self.longitude)?;
        let point = SamplePoint::new(
            self.id,
            latitude,
            longitude,
            self.color.unwrap_or_else(|| DEFAULT_PIN_COLOR.to_string()),
        );
        Some(match self.label {
            Some(label) if !label.trim().is_empty() => point.with_label(label),
            _ => point,
        })
    }
}

/// Pin color used when the host supplies none.
pub const DEFAULT_PIN_COLOR: &str = "#ff0000";

/// Take a snapshot of the current pins, dropping records with unusable
/// coordinates.
pub fn snapshot(raw: impl IntoIterator<Item = RawPin>) -> Vec<SamplePoint> {
    raw.into_iter().filter_map(RawPin::into_sample_point).collect()
}

/// Coerce a number-like JSON value to a finite `f64`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
