//! Rendering surface capability consumed by the capture pipeline.
//!
//! A surface lays out and paints markup. It is bound to the thread that
//! created it: every call below is made from the UI thread driving the
//! pipeline, so implementations need not be `Send`.

use crate::capture::RasterImage;
use crate::{Result, Viewport};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::oneshot;

/// Pending script evaluation. Resolves to the serialized result, or `None`
/// when the expression produced no value.
pub type ScriptFuture = LocalBoxFuture<'static, Result<Option<String>>>;

/// Settings applied to a surface before markup is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    /// Scripting is required to query computed layout dimensions
    pub javascript_enabled: bool,
    pub javascript_can_open_windows: bool,
    /// Report natural content width instead of clamping to the viewport
    pub use_wide_viewport: bool,
    pub load_with_overview_mode: bool,
    pub initial_scale: f32,
    /// Draw the whole document rather than only the visible part
    pub whole_document_draw: bool,
    pub allow_file_access: bool,
    pub allow_content_access: bool,
}

impl SurfaceSettings {
    /// Profile for ephemeral capture surfaces
    pub fn capture() -> Self {
        Self {
            javascript_enabled: true,
            javascript_can_open_windows: true,
            use_wide_viewport: true,
            load_with_overview_mode: true,
            initial_scale: 1.0,
            whole_document_draw: true,
            allow_file_access: true,
            allow_content_access: true,
        }
    }

    /// Profile for visible preview surfaces
    pub fn preview() -> Self {
        Self {
            whole_document_draw: false,
            allow_file_access: false,
            allow_content_access: false,
            ..Self::capture()
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self::capture()
    }
}

/// Host-controlled rendering surface.
pub trait RenderingSurface {
    /// Size the surface's layout box
    fn layout(&mut self, viewport: Viewport);

    /// Apply settings; called before `load_markup`
    fn apply_settings(&mut self, settings: &SurfaceSettings);

    /// Register interest in the next load-complete event.
    ///
    /// The receiver resolves once the surface finishes loading. If the surface
    /// is destroyed first the sender is dropped and the receiver errors.
    fn on_load_complete(&mut self) -> oneshot::Receiver<()>;

    /// Start loading markup with the given document type and encoding
    fn load_markup(&mut self, markup: &str, document_type: &str, encoding: &str) -> Result<()>;

    /// Evaluate a script expression against the loaded document
    fn evaluate_script(&mut self, expression: &str) -> ScriptFuture;

    /// Run a layout pass with no size constraint so the surface reports its natural size
    fn measure_unconstrained(&mut self);

    /// Paint the current visual tree into `target`
    fn draw(&mut self, target: &mut RasterImage) -> Result<()>;

    /// Release backend resources. Called exactly once, when the surface is disposed.
    fn destroy(&mut self) {}
}

/// Creates fresh surfaces on the UI thread.
pub trait SurfaceFactory {
    fn create_surface(&self) -> Result<Box<dyn RenderingSurface>>;
}

impl<F> SurfaceFactory for F
where
    F: Fn() -> Result<Box<dyn RenderingSurface>>,
{
    fn create_surface(&self) -> Result<Box<dyn RenderingSurface>> {
        self()
    }
}

/// Shared cell owning a surface until it is disposed.
///
/// Liveness of the capture is inferred from the cell: once `dispose` has run
/// every `with` call returns `None`, so pending continuations become no-ops.
#[derive(Clone)]
pub struct SurfaceSlot {
    inner: Rc<RefCell<Option<Box<dyn RenderingSurface>>>>,
}

impl SurfaceSlot {
    pub fn new(surface: Box<dyn RenderingSurface>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(surface))),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.try_borrow().map(|s| s.is_some()).unwrap_or(true)
    }

    /// Run `f` against the surface if it is still alive.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn RenderingSurface) -> R) -> Option<R> {
        let mut guard = self.inner.try_borrow_mut().ok()?;
        let surface = guard.as_mut()?;
        Some(f(surface.as_mut()))
    }

    /// Destroy the surface. Returns `false` if it was already disposed.
    pub fn dispose(&self) -> bool {
        let taken = match self.inner.try_borrow_mut() {
            Ok(mut guard) => guard.take(),
            Err(_) => {
                log::warn!(target: "printraster::surface", "dispose requested while surface is busy");
                None
            }
        };
        match taken {
            Some(mut surface) => {
                surface.destroy();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for SurfaceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSlot")
            .field("alive", &self.is_alive())
            .finish()
    }
}
