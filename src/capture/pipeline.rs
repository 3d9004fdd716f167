//! Capture orchestration.
//!
//! `CapturePipeline::capture` binds a request to a fresh surface and spawns
//! the rest of the work as a local task on the current `LocalSet`. Each
//! resumption point re-checks that the surface is still alive; once it has
//! been disposed the task finishes quietly without touching it.

use super::dimensions::{DimensionResolver, Resolution};
use super::encoder::{EncodedImage, ImageEncoder};
use super::rasterizer::Rasterizer;
use crate::platform::HostEnvironment;
use crate::request::CaptureRequest;
use crate::surface::{SurfaceFactory, SurfaceSlot};
use crate::{CaptureConfig, Error, InvalidDimensionPolicy, Result};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const TARGET: &str = "printraster::pipeline";

struct Stages {
    env: Arc<dyn HostEnvironment>,
    resolver: DimensionResolver,
    rasterizer: Rasterizer,
    encoder: ImageEncoder,
    policy: InvalidDimensionPolicy,
}

impl Stages {
    fn reject(&self, reason: String) -> Result<Option<EncodedImage>> {
        match self.policy {
            InvalidDimensionPolicy::Drop => {
                log::warn!(target: TARGET, "dropping capture: {}", reason);
                Ok(None)
            }
            InvalidDimensionPolicy::Fail => Err(Error::CaptureFailure(reason)),
        }
    }
}

/// Sequences load-wait, dimension resolution, rasterization and encoding.
///
/// Must be used from inside a `tokio::task::LocalSet`; surfaces are bound to
/// the thread that created them.
pub struct CapturePipeline {
    factory: Rc<dyn SurfaceFactory>,
    config: CaptureConfig,
    stages: Rc<Stages>,
}

impl CapturePipeline {
    pub fn new(
        factory: Rc<dyn SurfaceFactory>,
        env: Arc<dyn HostEnvironment>,
        config: CaptureConfig,
    ) -> Self {
        let stages = Stages {
            env,
            resolver: DimensionResolver::default(),
            rasterizer: Rasterizer::new(config.max_pixels),
            encoder: ImageEncoder::new(),
            policy: config.invalid_dimensions,
        };
        Self {
            factory,
            config,
            stages: Rc::new(stages),
        }
    }

    /// Replace the expressions used to read content size
    pub fn with_resolver(mut self, resolver: DimensionResolver) -> Self {
        if let Some(stages) = Rc::get_mut(&mut self.stages) {
            stages.resolver = resolver;
        }
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Start a capture on a fresh surface.
    ///
    /// Fails only if the surface cannot be created or refuses the markup; every
    /// later outcome is reported through the returned task.
    pub fn capture(&self, request: CaptureRequest) -> Result<CaptureTask> {
        let mut surface = self.factory.create_surface()?;

        let viewport = self.stages.env.viewport();
        log::debug!(target: TARGET, "dwidth : {}", viewport.width);
        log::debug!(target: TARGET, "dheight : {}", viewport.height);
        surface.layout(viewport);

        let mut settings = self.config.capture_settings.clone();
        // dimension queries go through the script channel
        settings.javascript_enabled = true;
        surface.apply_settings(&settings);

        let loaded = surface.on_load_complete();
        if let Err(e) = surface.load_markup(
            request.content(),
            request.document_type(),
            request.base_encoding(),
        ) {
            surface.destroy();
            return Err(e);
        }

        let slot = SurfaceSlot::new(surface);
        let task_slot = slot.clone();
        let stages = self.stages.clone();
        let settle = request.settle_delay();
        let handle = tokio::task::spawn_local(async move {
            let outcome = run(&task_slot, loaded, settle, &stages).await;
            // eligible for disposal once the result is known
            task_slot.dispose();
            outcome
        });

        Ok(CaptureTask { slot, handle })
    }
}

async fn run(
    slot: &SurfaceSlot,
    loaded: oneshot::Receiver<()>,
    settle: Duration,
    stages: &Stages,
) -> Result<Option<EncodedImage>> {
    if loaded.await.is_err() {
        log::debug!(target: TARGET, "surface disposed before load completed");
        return Ok(None);
    }

    log::debug!(target: TARGET, "load complete, settling for {:?}", settle);
    tokio::time::sleep(settle).await;
    if !slot.is_alive() {
        log::debug!(target: TARGET, "surface disposed during settle delay");
        return Ok(None);
    }

    let dims = match stages.resolver.resolve(slot).await {
        Resolution::Resolved(dims) => dims,
        Resolution::Disposed => return Ok(None),
        Resolution::Invalid { width, height } => {
            return stages.reject(format!(
                "content dimensions unavailable (width={:?}, height={:?})",
                width, height
            ))
        }
    };

    let density = stages.env.density();
    let raster = match slot.with(|s| stages.rasterizer.rasterize(s, dims, density)) {
        None => {
            log::debug!(target: TARGET, "surface disposed before rasterization");
            return Ok(None);
        }
        Some(None) => {
            return stages.reject(format!(
                "no raster for {}x{} units at density {}",
                dims.width_units, dims.height_units, density
            ))
        }
        Some(Some(raster)) => raster,
    };

    let encoded = stages.encoder.encode(raster)?;
    log::info!(
        target: TARGET,
        "Got snapshot: {} bytes, sha256 {}",
        encoded.len(),
        encoded.digest()
    );
    Ok(Some(encoded))
}

/// A capture in flight.
pub struct CaptureTask {
    slot: SurfaceSlot,
    handle: JoinHandle<Result<Option<EncodedImage>>>,
}

impl CaptureTask {
    /// Dispose the surface now; pending continuations become no-ops.
    pub fn dispose(&self) -> bool {
        self.slot.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        !self.slot.is_alive()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Handle that can dispose the surface after the task has been moved away
    pub fn canceller(&self) -> CaptureCanceller {
        CaptureCanceller {
            slot: self.slot.clone(),
        }
    }

    /// Wait for the capture to finish.
    ///
    /// `Ok(None)` means nothing was delivered: the surface was disposed, or
    /// dimensions were invalid under `InvalidDimensionPolicy::Drop`.
    pub async fn outcome(self) -> Result<Option<EncodedImage>> {
        self.handle
            .await
            .map_err(|e| Error::Other(format!("Capture task aborted: {}", e)))?
    }
}

/// Disposes a capture's surface from elsewhere on the UI thread.
#[derive(Debug, Clone)]
pub struct CaptureCanceller {
    slot: SurfaceSlot,
}

impl CaptureCanceller {
    pub fn dispose(&self) -> bool {
        self.slot.dispose()
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_alive()
    }
}
