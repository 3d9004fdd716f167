//! Host platform capabilities consumed by the pipeline
//!
//! The core only reads from the host: device pixel density and the usable
//! window size. Both come through `HostEnvironment` so tests and embedders
//! can supply deterministic values.

pub mod display;

pub use display::{DisplayMetrics, HostEnvironment, Insets, StaticEnvironment, WindowMetrics};
