//! Lossless serialization of raster images

use super::dimensions::PixelDimensions;
use super::rasterizer::RasterImage;
use crate::{Error, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder as _, ImageFormat};
use sha2::{Digest, Sha256};

/// PNG-encoded capture result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Decode back into a pixel buffer
    pub fn decode(&self) -> Result<RasterImage> {
        let img = image::load_from_memory_with_format(&self.bytes, ImageFormat::Png)
            .map_err(|e| Error::Other(format!("Failed to decode image: {}", e)))?;
        Ok(RasterImage::from_image(img.to_rgba8()))
    }

    /// Pixel size recorded in the image header
    pub fn size(&self) -> Result<PixelDimensions> {
        self.decode().map(|img| img.size())
    }
}

/// PNG encoder at the fixed maximum compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        ImageEncoder
    }

    /// Consume `image` and compress it.
    pub fn encode(&self, image: RasterImage) -> Result<EncodedImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Error::EncodingFailure(format!(
                "cannot encode an empty {}x{} buffer",
                width, height
            )));
        }

        let pixels = image.into_image();
        let mut bytes = Vec::new();
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive)
            .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        Ok(EncodedImage { bytes })
    }
}
