//! Passive preview surfaces.
//!
//! A host view registry instantiates these by name to show the markup on
//! screen. Creation params are validated before any surface exists; if they
//! are unusable the error is logged and the view is created without a
//! surface, so disposal still works.

use crate::error::ConstructionError;
use crate::request::{BASE_ENCODING, DOCUMENT_TYPE};
use crate::surface::{SurfaceFactory, SurfaceSettings, SurfaceSlot};
use crate::{Result, Viewport};
use serde_json::Value;
use std::rc::Rc;

const TARGET: &str = "printraster::preview";

/// Name the preview factory is registered under
pub const PREVIEW_VIEW_TYPE: &str = "webview-view-type";

/// Validated creation params for a preview surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCreationParams {
    pub width: u32,
    pub height: u32,
    pub content: String,
}

impl ViewCreationParams {
    pub fn new(
        width: i64,
        height: i64,
        content: impl Into<String>,
    ) -> std::result::Result<Self, ConstructionError> {
        let width = positive(width).ok_or(ConstructionError::InvalidWidth(width))?;
        let height = positive(height).ok_or(ConstructionError::InvalidHeight(height))?;
        Ok(Self {
            width,
            height,
            content: content.into(),
        })
    }

    /// Read params from the loosely typed map handed over by the host.
    ///
    /// Fields are checked in order: width, height, content.
    pub fn from_args(args: Option<&Value>) -> std::result::Result<Self, ConstructionError> {
        let map = args
            .and_then(Value::as_object)
            .ok_or(ConstructionError::MissingParams)?;

        let width = map
            .get("width")
            .and_then(Value::as_f64)
            .ok_or(ConstructionError::MissingWidth)?;
        let height = map
            .get("height")
            .and_then(Value::as_f64)
            .ok_or(ConstructionError::MissingHeight)?;
        let content = map
            .get("content")
            .and_then(Value::as_str)
            .ok_or(ConstructionError::MissingContent)?;

        Self::new(width as i64, height as i64, content)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

fn positive(v: i64) -> Option<u32> {
    u32::try_from(v).ok().filter(|v| *v > 0)
}

/// Contract of a named view factory in the host's view registry
pub trait PlatformViewFactory {
    fn view_type(&self) -> &'static str;
    fn create(&self, view_id: i64, args: Option<&Value>) -> PreviewView;
}

/// A visible surface showing the markup. Always disposable, even when
/// creation failed.
pub struct PreviewView {
    view_id: i64,
    params: Option<ViewCreationParams>,
    surface: Option<SurfaceSlot>,
}

impl PreviewView {
    pub fn view_id(&self) -> i64 {
        self.view_id
    }

    pub fn params(&self) -> Option<&ViewCreationParams> {
        self.params.as_ref()
    }

    /// Whether a live surface backs this view
    pub fn is_attached(&self) -> bool {
        self.surface.as_ref().map(SurfaceSlot::is_alive).unwrap_or(false)
    }

    pub fn surface(&self) -> Option<&SurfaceSlot> {
        self.surface.as_ref()
    }

    pub fn dispose(&mut self) {
        if let Some(slot) = self.surface.take() {
            slot.dispose();
            log::debug!(target: TARGET, "disposed preview {}", self.view_id);
        }
    }
}

impl Drop for PreviewView {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builds preview views on the UI thread.
pub struct PreviewViewFactory {
    factory: Rc<dyn SurfaceFactory>,
    settings: SurfaceSettings,
}

impl PreviewViewFactory {
    pub fn new(factory: Rc<dyn SurfaceFactory>) -> Self {
        Self {
            factory,
            settings: SurfaceSettings::preview(),
        }
    }

    /// Validate params, then create and load a surface.
    pub fn try_create(&self, params: &ViewCreationParams) -> Result<SurfaceSlot> {
        let mut surface = self.factory.create_surface()?;
        surface.layout(params.viewport());
        surface.apply_settings(&self.settings);
        if let Err(e) = surface.load_markup(&params.content, DOCUMENT_TYPE, BASE_ENCODING) {
            surface.destroy();
            return Err(e);
        }
        Ok(SurfaceSlot::new(surface))
    }
}

impl PlatformViewFactory for PreviewViewFactory {
    fn view_type(&self) -> &'static str {
        PREVIEW_VIEW_TYPE
    }

    fn create(&self, view_id: i64, args: Option<&Value>) -> PreviewView {
        let params = match ViewCreationParams::from_args(args) {
            Ok(p) => p,
            Err(e) => {
                log::error!(target: TARGET, "Error initializing preview {}: {}", view_id, e);
                return PreviewView {
                    view_id,
                    params: None,
                    surface: None,
                };
            }
        };

        let surface = match self.try_create(&params) {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::error!(target: TARGET, "Error initializing preview {}: {}", view_id, e);
                None
            }
        };

        PreviewView {
            view_id,
            params: Some(params),
            surface,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn each_missing_field_is_reported() {
        let full = json!({ "width": 300, "height": 200, "content": "<p>x</p>" });
        assert!(ViewCreationParams::from_args(Some(&full)).is_ok());

        for (field, expected) in [
            ("width", ConstructionError::MissingWidth),
            ("height", ConstructionError::MissingHeight),
            ("content", ConstructionError::MissingContent),
        ] {
            let mut args = full.clone();
            args.as_object_mut().unwrap().remove(field);
            assert_eq!(ViewCreationParams::from_args(Some(&args)), Err(expected));
        }

        assert_eq!(
            ViewCreationParams::from_args(None),
            Err(ConstructionError::MissingParams)
        );
        assert_eq!(
            ViewCreationParams::from_args(Some(&json!("nope"))),
            Err(ConstructionError::MissingParams)
        );
    }

    #[test]
    fn wrong_types_count_as_missing() {
        let args = json!({ "width": "300", "height": 200, "content": "<p>x</p>" });
        assert_eq!(
            ViewCreationParams::from_args(Some(&args)),
            Err(ConstructionError::MissingWidth)
        );
        let args = json!({ "width": 300, "height": 200, "content": 5 });
        assert_eq!(
            ViewCreationParams::from_args(Some(&args)),
            Err(ConstructionError::MissingContent)
        );
    }

    #[test]
    fn sizes_must_be_positive() {
        assert_eq!(
            ViewCreationParams::new(0, 10, ""),
            Err(ConstructionError::InvalidWidth(0))
        );
        assert_eq!(
            ViewCreationParams::new(10, -4, ""),
            Err(ConstructionError::InvalidHeight(-4))
        );
        let p = ViewCreationParams::from_args(Some(&json!({ "width": 320.7, "height": 48, "content": "" })))
            .unwrap();
        assert_eq!(p.viewport(), Viewport { width: 320, height: 48 });
    }
}
