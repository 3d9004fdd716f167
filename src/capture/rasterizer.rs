//! Pixel buffer snapshot of a surface

use super::dimensions::{Dimensions, PixelDimensions};
use crate::surface::RenderingSurface;
use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};

const TARGET: &str = "printraster::rasterizer";

/// Default upper bound on raster area (64 megapixels)
pub const DEFAULT_MAX_PIXELS: u64 = 64 * 1024 * 1024;

/// Owned RGBA8888 pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Fully transparent buffer of the given size
    pub fn new(size: PixelDimensions) -> Self {
        Self {
            pixels: RgbaImage::new(size.width_px, size.height_px),
        }
    }

    /// Wrap raw RGBA bytes; `None` if the length does not match the size
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(|pixels| Self { pixels })
    }

    pub(crate) fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> PixelDimensions {
        PixelDimensions::new(self.width(), self.height())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba(rgba);
        }
    }

    /// Fill a rectangle, clipped to the buffer
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, rgba: [u8; 4]) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(i64::from(width)).min(i64::from(self.width()));
        let y1 = y.saturating_add(i64::from(height)).min(i64::from(self.height()));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.pixels.put_pixel(xx as u32, yy as u32, Rgba(rgba));
            }
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Hex SHA-256 of the raw pixel data
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.as_raw()))
    }

    pub(crate) fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

/// Forces a layout pass and snapshots the surface into a fresh buffer.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    max_pixels: u64,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXELS)
    }
}

impl Rasterizer {
    pub fn new(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    /// Snapshot the surface at `dims` scaled by `density`.
    ///
    /// Returns `None` for invalid dimensions; that is an expected outcome, not an error.
    pub fn rasterize(
        &self,
        surface: &mut dyn RenderingSurface,
        dims: Dimensions,
        density: f64,
    ) -> Option<RasterImage> {
        if !dims.is_valid() {
            log::debug!(target: TARGET, "refusing to rasterize {:?}", dims);
            return None;
        }
        self.rasterize_pixels(surface, dims.to_pixels(density))
    }

    /// Snapshot the surface at an exact pixel size.
    ///
    /// Captures the frame as it is at call time; content still animating is not waited for.
    pub fn rasterize_pixels(
        &self,
        surface: &mut dyn RenderingSurface,
        px: PixelDimensions,
    ) -> Option<RasterImage> {
        if !px.is_drawable() {
            log::debug!(target: TARGET, "empty raster size {}x{}", px.width_px, px.height_px);
            return None;
        }
        if px.area() > self.max_pixels {
            log::warn!(
                target: TARGET,
                "raster {}x{} exceeds the {} pixel limit",
                px.width_px,
                px.height_px,
                self.max_pixels
            );
            return None;
        }

        surface.measure_unconstrained();
        let mut image = RasterImage::new(px);
        match surface.draw(&mut image) {
            Ok(()) => Some(image),
            Err(e) => {
                log::warn!(target: TARGET, "drawing surface failed: {}", e);
                None
            }
        }
    }
}
