//! One raster image and the color queries made against it.
//!
//! A sampler moves through `Empty -> Loaded -> Disposed`. Loading decodes the
//! image; the RGBA pixel buffer is only materialized on the first color
//! query and then reused for every further point on the same frame.
//!
//! Samplers are meant to live for exactly one frame. Dropping one releases
//! the decoded image and buffer.

use image::{DynamicImage, GenericImageView, RgbaImage};
use neo_common::Rgb;
use projection::{lat_long_to_pixel, PixelCoord};
use tracing::{debug, instrument};

use crate::error::{RasterError, Result};
use crate::source::ImageSource;

#[derive(Default)]
enum SamplerState {
    #[default]
    Empty,
    Loaded(LoadedRaster),
    Disposed,
}

struct LoadedRaster {
    url: String,
    image: DynamicImage,
    pixels: Option<RgbaImage>,
}

/// Owns one decoded raster and answers color-at-coordinate queries.
#[derive(Default)]
pub struct RasterSampler {
    state: SamplerState,
}

impl RasterSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and decode the raster at `url`.
    ///
    /// A sampler that already holds an image replaces it.
    #[instrument(skip(self, source))]
    pub async fn load<S: ImageSource + ?Sized>(&mut self, source: &S, url: &str) -> Result<()> {
        if matches!(self.state, SamplerState::Disposed) {
            return Err(RasterError::Disposed);
        }
        let bytes = source.fetch(url).await?;

        // Decode runs off the async workers.
        let owned_url = url.to_string();
        let image = tokio::task::spawn_blocking(move || decode(&owned_url, &bytes))
            .await
            .map_err(|e| RasterError::load(url, format!("decode task failed: {}", e)))??;
        self.set_loaded(url, image);
        Ok(())
    }

    /// Decode already-fetched raster bytes on the calling thread.
    pub fn load_bytes(&mut self, url: &str, bytes: &[u8]) -> Result<()> {
        if matches!(self.state, SamplerState::Disposed) {
            return Err(RasterError::Disposed);
        }
        let image = decode(url, bytes)?;
        self.set_loaded(url, image);
        Ok(())
    }

    fn set_loaded(&mut self, url: &str, image: DynamicImage) {
        self.state = SamplerState::Loaded(LoadedRaster {
            url: url.to_string(),
            image,
            pixels: None,
        });
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SamplerState::Loaded(_))
    }

    /// Image dimensions of the loaded raster.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(self.loaded()?.image.dimensions())
    }

    /// URL the current raster was loaded from.
    pub fn url(&self) -> Result<&str> {
        Ok(&self.loaded()?.url)
    }

    /// Pixel that (lat, long) falls in.
    pub fn pixel_for(&self, lat: f64, long: f64) -> Result<PixelCoord> {
        let (width, height) = self.dimensions()?;
        Ok(lat_long_to_pixel(width, height, lat, long)?)
    }

    /// Color of the pixel containing (lat, long). Alpha is discarded.
    pub fn extract_color(&mut self, lat: f64, long: f64) -> Result<Rgb> {
        let raster = self.loaded_mut()?;
        let (width, height) = raster.image.dimensions();
        let PixelCoord { x, y } = lat_long_to_pixel(width, height, lat, long)?;

        let image = &raster.image;
        let pixels = raster.pixels.get_or_insert_with(|| image.to_rgba8());
        let [r, g, b, _] = pixels.get_pixel(x, y).0;
        Ok(Rgb::new(r, g, b))
    }

    /// Release the decoded image and pixel buffer. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let SamplerState::Loaded(raster) = &self.state {
            debug!(url = %raster.url, "Disposing raster");
        }
        self.state = SamplerState::Disposed;
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, SamplerState::Disposed)
    }

    fn loaded(&self) -> Result<&LoadedRaster> {
        match &self.state {
            SamplerState::Loaded(raster) => Ok(raster),
            SamplerState::Empty => Err(RasterError::NotLoaded),
            SamplerState::Disposed => Err(RasterError::Disposed),
        }
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedRaster> {
        match &mut self.state {
            SamplerState::Loaded(raster) => Ok(raster),
            SamplerState::Empty => Err(RasterError::NotLoaded),
            SamplerState::Disposed => Err(RasterError::Disposed),
        }
    }

    #[cfg(test)]
    fn has_pixel_buffer(&self) -> bool {
        matches!(&self.state, SamplerState::Loaded(r) if r.pixels.is_some())
    }
}

fn decode(url: &str, bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(|e| RasterError::load(url, format!("decode failed: {}", e)))?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RasterError::load(url, "image has no pixels"));
    }
    debug!(url, width, height, "Decoded raster");
    Ok(image)
}
