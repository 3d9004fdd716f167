//! Content size resolution.
//!
//! Content dimensions are only known once layout has finished, so they are
//! read back from the surface through its script channel: width first, and
//! height only once the width result has arrived.

use crate::surface::SurfaceSlot;

const TARGET: &str = "printraster::dimensions";

/// Content size in layout units (device independent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width_units: f64,
    pub height_units: f64,
}

impl Dimensions {
    pub fn new(width_units: f64, height_units: f64) -> Self {
        Self {
            width_units,
            height_units,
        }
    }

    /// Both sides strictly positive and finite
    pub fn is_valid(&self) -> bool {
        self.width_units.is_finite()
            && self.height_units.is_finite()
            && self.width_units > 0.0
            && self.height_units > 0.0
    }

    pub fn to_pixels(&self, density: f64) -> PixelDimensions {
        PixelDimensions {
            width_px: scale(self.width_units, density),
            height_px: scale(self.height_units, density),
        }
    }
}

/// Content size in device pixels. Magnitude only: the sign of the layout
/// value is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelDimensions {
    pub width_px: u32,
    pub height_px: u32,
}

impl PixelDimensions {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self { width_px, height_px }
    }

    pub fn is_drawable(&self) -> bool {
        self.width_px > 0 && self.height_px > 0
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width_px) * u64::from(self.height_px)
    }
}

// float -> int casts saturate and map NaN to 0
fn scale(units: f64, density: f64) -> u32 {
    (units * density).abs().round() as u32
}

/// Outcome of a dimension query
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Dimensions),
    /// At least one side was absent, empty or not a number
    Invalid {
        width: Option<String>,
        height: Option<String>,
    },
    /// The surface went away while a query was in flight
    Disposed,
}

/// Reads the computed content size back from a surface.
#[derive(Debug, Clone)]
pub struct DimensionResolver {
    width_expression: String,
    height_expression: String,
}

impl Default for DimensionResolver {
    fn default() -> Self {
        Self {
            width_expression: "document.body.offsetWidth".to_string(),
            height_expression: "document.body.offsetHeight".to_string(),
        }
    }
}

impl DimensionResolver {
    pub fn new(width_expression: impl Into<String>, height_expression: impl Into<String>) -> Self {
        Self {
            width_expression: width_expression.into(),
            height_expression: height_expression.into(),
        }
    }

    /// Query width, then height. The height query is only issued after the
    /// width result arrives; at most one evaluation is in flight per surface.
    pub async fn resolve(&self, slot: &SurfaceSlot) -> Resolution {
        let width_raw = match query(slot, &self.width_expression).await {
            Some(v) => v,
            None => return Resolution::Disposed,
        };
        let height_raw = match query(slot, &self.height_expression).await {
            Some(v) => v,
            None => return Resolution::Disposed,
        };

        log::debug!(target: TARGET, "offsetWidth : {:?}", width_raw);
        log::debug!(target: TARGET, "offsetHeight : {:?}", height_raw);

        match (parse_units(width_raw.as_deref()), parse_units(height_raw.as_deref())) {
            (Some(w), Some(h)) => Resolution::Resolved(Dimensions::new(w, h)),
            _ => Resolution::Invalid {
                width: width_raw,
                height: height_raw,
            },
        }
    }
}

/// `None` when the surface was disposed; `Some(None)` for an absent result.
async fn query(slot: &SurfaceSlot, expression: &str) -> Option<Option<String>> {
    let pending = slot.with(|s| s.evaluate_script(expression))?;
    let result = pending.await;
    if !slot.is_alive() {
        log::debug!(target: TARGET, "surface disposed while evaluating {}", expression);
        return None;
    }
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(target: TARGET, "evaluating {} failed: {}", expression, e);
            Some(None)
        }
    }
}

/// Parse a serialized script result as layout units.
pub fn parse_units(raw: Option<&str>) -> Option<f64> {
    let mut s = raw?.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s = s[1..s.len() - 1].trim();
    }
    if s.is_empty() || s == "null" || s == "undefined" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
