//! printraster
//!
//! Renders a markup document on an off-screen surface and turns the result
//! into a PNG suitable for a receipt printer pipeline.
//!
//! A capture runs as a chain of continuations on a single UI thread:
//! load markup, wait for load completion, wait out the settle delay, read
//! the content width and then the height from the surface, snapshot the
//! surface at device-pixel size and encode the snapshot.
//!
//! # Features
//!
//! - **Pluggable surfaces**: the pipeline only talks to `RenderingSurface`,
//!   so any headless rendering engine can back it
//! - **Block surface** (default, feature `block-surface`): a small pure-Rust
//!   surface that lays out simple block documents
//! - **Async facade**: `RenderHost` owns the UI thread and exposes the
//!   `contentToImage` command to callers on any thread
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "block-surface")]
//! # async fn run() -> printraster::Result<()> {
//! use printraster::platform::StaticEnvironment;
//! use printraster::rendering::BlockSurface;
//! use printraster::{CaptureConfig, RenderHost};
//! use std::sync::Arc;
//!
//! let env = Arc::new(StaticEnvironment::with_density(2.0));
//! let host = RenderHost::new(BlockSurface::factory(env.clone()), env, CaptureConfig::default()).await?;
//! let png = host
//!     .content_to_image("<body style='width:100px;height:50px'>x</body>", None)
//!     .await?;
//! assert!(png.is_some());
//! host.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{ConstructionError, Error, Result};

pub mod capture;
pub mod channel;
pub mod host;
pub mod platform;
pub mod preview;
pub mod request;
pub mod surface;

// Built-in pure-Rust surface: markup parse, block layout, paint, raster
#[cfg(feature = "block-surface")]
pub mod rendering;

pub use capture::{
    CaptureCanceller, CapturePipeline, CaptureTask, DimensionResolver, Dimensions, EncodedImage,
    ImageEncoder, PixelDimensions, RasterImage, Rasterizer,
};
pub use channel::{CaptureChannel, MethodCall, MethodResponse, Responder};
pub use host::RenderHost;
pub use request::CaptureRequest;
pub use surface::{RenderingSurface, SurfaceFactory, SurfaceSettings, SurfaceSlot};

/// What the pipeline does when content dimensions cannot be resolved or the
/// surface yields no raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidDimensionPolicy {
    /// Log a warning and never deliver a result
    #[default]
    Drop,
    /// Deliver an explicit `Error::CaptureFailure`
    Fail,
}

/// Configuration for capture pipelines
///
/// # Examples
///
/// ```
/// let cfg = printraster::CaptureConfig::default();
/// assert_eq!(cfg.invalid_dimensions, printraster::InvalidDimensionPolicy::Drop);
/// assert!(cfg.capture_settings.javascript_enabled);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub invalid_dimensions: InvalidDimensionPolicy,
    /// Settings applied to every capture surface
    pub capture_settings: SurfaceSettings,
    /// Largest raster area, in pixels, the rasterizer will allocate
    pub max_pixels: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            invalid_dimensions: InvalidDimensionPolicy::Drop,
            capture_settings: SurfaceSettings::capture(),
            max_pixels: capture::DEFAULT_MAX_PIXELS,
        }
    }
}

/// Viewport dimensions in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
