//! Reverse lookup from sampled color to palette index.
//!
//! Indexed rasters store the measurement as a palette index and render it
//! through the color table. Inverting the table recovers the index from a
//! rendered RGB sample.
//!
//! The table is read from one reference raster per dataset and assumed to be
//! identical for every other frame of that dataset. This is a precondition of
//! the data source and is not re-checked per frame.

use std::collections::HashMap;

use neo_common::Rgb;
use tracing::{debug, instrument, warn};

use crate::error::{RasterError, Result};
use crate::png::{read_palette, Palette};
use crate::source::ImageSource;

/// Index reported for colors that are not in the palette.
pub const UNKNOWN_PALETTE_INDEX: i32 = -1;

/// Packed RGB -> palette index.
///
/// When several palette entries share one color the entry with the highest
/// index wins, so lookups for that color always resolve to a single index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReversePalette {
    index_by_color: HashMap<u32, u8>,
    collisions: Vec<(Rgb, Vec<u8>)>,
}

impl ReversePalette {
    /// Invert a palette.
    pub fn from_palette(palette: &Palette) -> Self {
        let mut index_by_color: HashMap<u32, u8> = HashMap::with_capacity(palette.len());
        let mut shared: HashMap<u32, Vec<u8>> = HashMap::new();

        for (i, color) in palette.colors.iter().enumerate() {
            let index = i as u8;
            if let Some(previous) = index_by_color.insert(color.packed(), index) {
                shared.entry(color.packed()).or_insert_with(|| vec![previous]).push(index);
            }
        }

        let mut collisions: Vec<(Rgb, Vec<u8>)> = shared
            .into_iter()
            .map(|(packed, indices)| (Rgb::from_packed(packed), indices))
            .collect();
        collisions.sort_by_key(|(_, indices)| indices[0]);

        Self { index_by_color, collisions }
    }

    /// Palette index for a sampled color, or [`UNKNOWN_PALETTE_INDEX`].
    pub fn lookup(&self, color: Rgb) -> i32 {
        self.index_by_color
            .get(&color.packed())
            .map_or(UNKNOWN_PALETTE_INDEX, |&i| i as i32)
    }

    pub fn len(&self) -> usize {
        self.index_by_color.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_by_color.is_empty()
    }

    /// Colors rendered by more than one palette index, with all such indices
    /// in ascending order.
    pub fn collisions(&self) -> &[(Rgb, Vec<u8>)] {
        &self.collisions
    }
}

/// Fetch the reference raster and build its reverse palette.
///
/// # Errors
/// - [`RasterError::Load`] if the raster cannot be fetched
/// - [`RasterError::InvalidPng`] if the bytes are not a PNG container
/// - [`RasterError::PaletteMissing`] if the PNG has no color table
#[instrument(skip(source))]
pub async fn build_reverse_palette<S: ImageSource + ?Sized>(source: &S, url: &str) -> Result<ReversePalette> {
    let bytes = source.fetch(url).await?;
    let palette = read_palette(&bytes)?.ok_or_else(|| RasterError::PaletteMissing { url: url.to_string() })?;

    let reverse = ReversePalette::from_palette(&palette);
    for (color, indices) in reverse.collisions() {
        warn!(
            color = %color,
            indices = ?indices,
            resolved = reverse.lookup(*color),
            "Palette maps several indices to one color"
        );
    }
    debug!(entries = palette.len(), distinct = reverse.len(), "Built reverse palette");
    Ok(reverse)
}
