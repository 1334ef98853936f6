//! RGB colors as sampled from rasters and as exchanged with the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NeoError;

/// An opaque 8-bit RGB color. Alpha is dropped on extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into a 24-bit integer: `(r << 16) | (g << 8) | b`.
    #[inline(always)]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Inverse of [`Rgb::packed`]. Bits above 24 are ignored.
    #[inline(always)]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = NeoError;

    /// Accepts `#rrggbb` or `rrggbb`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(NeoError::InvalidColor(s.to_string()));
        }
        let packed =
            u32::from_str_radix(hex, 16).map_err(|_| NeoError::InvalidColor(s.to_string()))?;
        Ok(Rgb::from_packed(packed))
    }
}
