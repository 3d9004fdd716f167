//! Error types for the capture pipeline

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing markup to a raster image
#[derive(Error, Debug)]
pub enum Error {
    /// The capture request was rejected before a surface was created
    #[error("Invalid capture request: {0}")]
    InvalidRequest(String),

    /// Preview surface creation params were missing or invalid
    #[error("Invalid view creation params: {0}")]
    Construction(#[from] ConstructionError),

    /// The rendering surface could not be created or refused an operation
    #[error("Rendering surface error: {0}")]
    Surface(String),

    /// Failed to evaluate a script on the surface
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// Failed to lay out or draw the surface
    #[error("Rendering failed: {0}")]
    Render(String),

    /// The compressor could not serialize the pixel buffer
    #[error("Failed to encode raster image: {0}")]
    EncodingFailure(String),

    /// The pipeline could not produce an image (explicit failure policy)
    #[error("Capture failed: {0}")]
    CaptureFailure(String),

    /// The surface was disposed before the operation finished
    #[error("Rendering surface was disposed")]
    Disposed,

    /// The UI thread backing a `RenderHost` is gone
    #[error("Render host unavailable: {0}")]
    HostUnavailable(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Which part of the preview creation params was missing or unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("Creation params must not be null")]
    MissingParams,

    #[error("Width must not be null")]
    MissingWidth,

    #[error("Height must not be null")]
    MissingHeight,

    #[error("Content must not be null")]
    MissingContent,

    #[error("Width must be positive, got {0}")]
    InvalidWidth(i64),

    #[error("Height must be positive, got {0}")]
    InvalidHeight(i64),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodingFailure(err.to_string())
    }
}

impl Error {
    /// Short machine-readable code used on the RPC boundary
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) | Error::Construction(_) => "invalid-arguments",
            Error::Surface(_) => "surface-error",
            Error::Script(_) => "script-error",
            Error::Render(_) => "render-error",
            Error::EncodingFailure(_) => "encoding-failure",
            Error::CaptureFailure(_) => "capture-failure",
            Error::Disposed => "disposed",
            Error::HostUnavailable(_) => "host-unavailable",
            Error::Other(_) => "error",
        }
    }
}
