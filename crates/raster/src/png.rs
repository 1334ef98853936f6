//! PNG container reading.
//!
//! Pixel decoding is left to the `image` crate. This module only walks the
//! chunk stream, which is where the color table of an indexed PNG
//! (color type 3) lives:
//! - `IHDR`: dimensions, bit depth and color type
//! - `PLTE`: up to 256 RGB entries, in index order
//! - `tRNS`: optional per-entry alpha
//!
//! Every chunk CRC is verified.

use neo_common::Rgb;

use crate::error::{RasterError, Result};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum entries in a PNG color table.
pub const MAX_PALETTE_SIZE: usize = 256;

/// Color type of an indexed PNG.
pub const COLOR_TYPE_INDEXED: u8 = 3;

/// A chunk borrowed from the container bytes.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
}

impl Chunk<'_> {
    pub fn kind_str(&self) -> &str {
        std::str::from_utf8(&self.kind).unwrap_or("????")
    }
}

/// Decoded `IHDR` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
}

impl PngHeader {
    pub fn is_indexed(&self) -> bool {
        self.color_type == COLOR_TYPE_INDEXED
    }
}

/// Embedded color table of an indexed PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<Rgb>,
    /// Alpha per entry; entries past the end of `tRNS` are opaque.
    pub alpha: Vec<u8>,
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

/// Split a PNG into its chunks, stopping after `IEND`.
pub fn read_chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return Err(RasterError::invalid_png("missing PNG signature"));
    }

    let mut chunks = Vec::new();
    let mut offset = PNG_SIGNATURE.len();

    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + 8)
            .ok_or_else(|| RasterError::invalid_png(format!("truncated chunk header at byte {}", offset)))?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];

        let data_start = offset + 8;
        let data_end = data_start
            .checked_add(length)
            .ok_or_else(|| RasterError::invalid_png("chunk length overflow"))?;
        let data = bytes
            .get(data_start..data_end)
            .ok_or_else(|| RasterError::invalid_png(format!("truncated chunk data at byte {}", data_start)))?;
        let crc_bytes = bytes
            .get(data_end..data_end + 4)
            .ok_or_else(|| RasterError::invalid_png(format!("truncated CRC at byte {}", data_end)))?;
        let stored_crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&kind);
        hasher.update(data);
        if hasher.finalize() != stored_crc {
            return Err(RasterError::invalid_png(format!(
                "CRC mismatch in {} chunk",
                String::from_utf8_lossy(&kind)
            )));
        }

        chunks.push(Chunk { kind, data });
        offset = data_end + 4;

        if &kind == b"IEND" {
            break;
        }
    }

    Ok(chunks)
}

/// Parse the `IHDR` chunk, which must come first.
pub fn read_header(chunks: &[Chunk<'_>]) -> Result<PngHeader> {
    let ihdr = chunks
        .first()
        .filter(|c| &c.kind == b"IHDR")
        .ok_or_else(|| RasterError::invalid_png("first chunk is not IHDR"))?;
    if ihdr.data.len() != 13 {
        return Err(RasterError::invalid_png(format!("IHDR has {} bytes, expected 13", ihdr.data.len())));
    }
    let d = ihdr.data;
    Ok(PngHeader {
        width: u32::from_be_bytes([d[0], d[1], d[2], d[3]]),
        height: u32::from_be_bytes([d[4], d[5], d[6], d[7]]),
        bit_depth: d[8],
        color_type: d[9],
    })
}

/// Extract the embedded palette, if the container has one.
///
/// A `PLTE` chunk is returned for any color type; truecolor PNGs may carry a
/// suggested palette too.
pub fn read_palette(bytes: &[u8]) -> Result<Option<Palette>> {
    let chunks = read_chunks(bytes)?;
    read_header(&chunks)?;

    let Some(plte) = chunks.iter().find(|c| &c.kind == b"PLTE") else {
        return Ok(None);
    };
    if plte.data.len() % 3 != 0 || plte.data.len() / 3 > MAX_PALETTE_SIZE {
        return Err(RasterError::invalid_png(format!("PLTE has invalid length {}", plte.data.len())));
    }

    let colors: Vec<Rgb> = plte
        .data
        .chunks_exact(3)
        .map(|c| Rgb::new(c[0], c[1], c[2]))
        .collect();

    let mut alpha = vec![255u8; colors.len()];
    if let Some(trns) = chunks.iter().find(|c| &c.kind == b"tRNS") {
        for (slot, a) in alpha.iter_mut().zip(trns.data) {
            *slot = *a;
        }
    }

    Ok(Some(Palette { colors, alpha }))
}
