//! Pin input: `--pin` flags and pins files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use neo_common::pin::{snapshot, DEFAULT_PIN_COLOR};
use neo_common::{RawPin, Rgb, SamplePoint};
use tracing::warn;

/// Parse `lat,long[,color]`.
pub fn parse_pin_arg(arg: &str, id: usize) -> Result<SamplePoint> {
    let parts: Vec<&str> = arg.split(',').map(str::trim).collect();
    let (lat, long, color) = match parts.as_slice() {
        [lat, long] => (*lat, *long, DEFAULT_PIN_COLOR),
        [lat, long, color] => (*lat, *long, *color),
        _ => bail!("pin '{}' must be lat,long[,color]", arg),
    };
    let latitude: f64 = lat.parse().with_context(|| format!("pin '{}': bad latitude", arg))?;
    let longitude: f64 = long.parse().with_context(|| format!("pin '{}': bad longitude", arg))?;
    if !latitude.is_finite() || !longitude.is_finite() {
        bail!("pin '{}': coordinates must be finite", arg);
    }
    let color: Rgb = color.parse().with_context(|| format!("pin '{}'", arg))?;
    Ok(SamplePoint::new(format!("pin-{}", id + 1), latitude, longitude, color.to_hex()))
}

/// Load a YAML or JSON list of pin records. Records without numeric
/// coordinates are dropped.
pub fn load_pins_file(path: &Path) -> Result<Vec<SamplePoint>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading pins file {}", path.display()))?;
    let raw: Vec<RawPin> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?,
        _ => serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?,
    };
    let total = raw.len();
    let points = snapshot(raw);
    if points.len() < total {
        warn!(dropped = total - points.len(), file = %path.display(), "Ignoring pins without numeric coordinates");
    }
    Ok(points)
}
