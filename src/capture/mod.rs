//! Render -> measure -> capture -> encode

pub mod dimensions;
pub mod encoder;
pub mod pipeline;
pub mod rasterizer;

pub use dimensions::{DimensionResolver, Dimensions, PixelDimensions, Resolution};
pub use encoder::{EncodedImage, ImageEncoder};
pub use pipeline::{CaptureCanceller, CapturePipeline, CaptureTask};
pub use rasterizer::{RasterImage, Rasterizer, DEFAULT_MAX_PIXELS};
