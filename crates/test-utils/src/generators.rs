//! Synthetic raster generators.
//!
//! Rasters are written with a small in-crate PNG encoder so tests control
//! the exact color table and index layout:
//! - **Indexed PNG (color type 3)**: `PLTE` plus optional `tRNS`, one index
//!   byte per pixel
//! - **RGBA PNG (color type 6)**: no color table, for palette-missing cases

use std::io::Write;

/// PNG signature bytes.
const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Create an indexed PNG (color type 3) from palette and indices.
///
/// `indices` is row-major, `width * height` entries.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> Result<Vec<u8>, String> {
    if indices.len() != width * height {
        return Err(format!("expected {} indices, got {}", width * height, indices.len()));
    }
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth (8 bits per palette index)
    ihdr_data.push(3); // color type 3 = indexed
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    let plte_data: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte_data);

    if palette.iter().any(|(_, _, _, a)| *a < 255) {
        let trns_data: Vec<u8> = palette.iter().map(|(_, _, _, a)| *a).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    let idat_data = deflate_scanlines(indices, width, height, 1)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a truecolor RGBA PNG (color type 6). It carries no palette.
pub fn create_png_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    if pixels.len() != width * height * 4 {
        return Err(format!("expected {} bytes, got {}", width * height * 4, pixels.len()));
    }
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0);
    ihdr_data.push(0);
    ihdr_data.push(0);
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    let idat_data = deflate_scanlines(pixels, width, height, 4)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk: length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter byte 0 and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let stride = width * bytes_per_pixel;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in data.chunks_exact(stride.max(1)).take(height) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    Ok(encoder.finish()?)
}

/// A 256-entry palette of pairwise distinct opaque colors.
///
/// Entry `i` is `(i, 255 - i, (i * 37) % 256)`.
pub fn ramp_palette() -> Vec<(u8, u8, u8, u8)> {
    (0..=255u8)
        .map(|i| (i, 255 - i, (i as u16 * 37 % 256) as u8, 255))
        .collect()
}

/// Like [`ramp_palette`] but entries 0 and 255 both render black.
pub fn ramp_palette_with_black_collision() -> Vec<(u8, u8, u8, u8)> {
    let mut palette = ramp_palette();
    palette[0] = (0, 0, 0, 255);
    palette[255] = (0, 0, 0, 255);
    palette
}

/// Indexed PNG filled with a single palette entry.
pub fn solid_color_png(width: usize, height: usize, rgb: (u8, u8, u8)) -> Vec<u8> {
    let (r, g, b) = rgb;
    create_png_indexed(width, height, &[(r, g, b, 255)], &vec![0; width * height])
        .unwrap_or_default()
}

/// Indexed PNG using `palette`, every pixel set to `index`.
pub fn uniform_index_png(width: usize, height: usize, palette: &[(u8, u8, u8, u8)], index: u8) -> Vec<u8> {
    create_png_indexed(width, height, palette, &vec![index; width * height]).unwrap_or_default()
}

/// Indexed PNG whose palette index at (x, y) is `f(x, y)`.
pub fn indexed_png_with(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    f: impl Fn(usize, usize) -> u8,
) -> Vec<u8> {
    let mut indices = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            indices.push(f(x, y));
        }
    }
    create_png_indexed(width, height, palette, &indices).unwrap_or_default()
}
