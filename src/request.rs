//! Capture request submitted by callers

use crate::{Error, Result};
use std::time::Duration;

/// Encoding markup is loaded with
pub const BASE_ENCODING: &str = "UTF-8";

/// Document type markup is loaded as
pub const DOCUMENT_TYPE: &str = "text/HTML";

/// A single markup-to-image capture.
///
/// Immutable once constructed; `content` is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    content: String,
    settle_delay_millis: u64,
}

impl CaptureRequest {
    /// Build a request, rejecting empty markup.
    pub fn new(content: impl Into<String>, settle_delay_millis: u64) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(Error::InvalidRequest("content must not be empty".into()));
        }
        Ok(Self {
            content,
            settle_delay_millis,
        })
    }

    /// Build a request from a caller-supplied duration in (possibly fractional) milliseconds.
    ///
    /// Missing, negative or non-finite durations become zero.
    pub fn with_duration(content: impl Into<String>, duration_ms: Option<f64>) -> Result<Self> {
        let millis = match duration_ms {
            Some(d) if d.is_finite() && d > 0.0 => d as u64,
            _ => 0,
        };
        Self::new(content, millis)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn settle_delay_millis(&self) -> u64 {
        self.settle_delay_millis
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_millis)
    }

    pub fn base_encoding(&self) -> &'static str {
        BASE_ENCODING
    }

    pub fn document_type(&self) -> &'static str {
        DOCUMENT_TYPE
    }
}
