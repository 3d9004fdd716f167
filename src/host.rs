use crate::channel::{CaptureChannel, MethodCall, MethodResponse, OneshotResponder};
use crate::capture::{CapturePipeline, EncodedImage};
use crate::platform::HostEnvironment;
use crate::preview::{PlatformViewFactory, PreviewView, PreviewViewFactory};
use crate::surface::SurfaceFactory;
use crate::{CaptureConfig, Error, Result};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

const TARGET: &str = "printraster::host";

enum Command {
    Invoke(MethodCall, oneshot::Sender<MethodResponse>),
    CreatePreview(i64, Option<serde_json::Value>, oneshot::Sender<bool>),
    DisposePreview(i64, oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<usize>),
}

/// An async-friendly capture service backed by a dedicated UI thread.
///
/// The UI thread runs a single-threaded event loop and owns every rendering
/// surface, so callers on any thread or runtime can submit captures without
/// the surfaces ever leaving that thread.
#[derive(Clone)]
pub struct RenderHost {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl RenderHost {
    /// Spawn the UI thread. `factory` is moved there and creates every surface.
    pub async fn new<F>(
        factory: F,
        env: Arc<dyn HostEnvironment>,
        config: CaptureConfig,
    ) -> Result<Self>
    where
        F: SurfaceFactory + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new()
            .name("printraster-ui".into())
            .spawn(move || ui_thread_main(factory, env, config, cmd_rx, init_tx))
            .map_err(|e| Error::HostUnavailable(format!("Failed to spawn UI thread: {}", e)))?;

        // Wait for the UI thread to report its event loop is running
        init_rx
            .await
            .map_err(|e| Error::HostUnavailable(format!("UI thread init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    /// Send a raw method call.
    ///
    /// `Ok(None)` means the call ended without any reply.
    pub async fn invoke(&self, call: MethodCall) -> Result<Option<MethodResponse>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Invoke(call, tx))
            .map_err(|_| Error::HostUnavailable("UI thread has shut down".into()))?;
        Ok(rx.await.ok())
    }

    /// Capture `content` as PNG.
    ///
    /// `Ok(None)` means the capture ended without delivering anything (see
    /// `InvalidDimensionPolicy::Drop`); callers wanting a deadline should
    /// wrap this in `tokio::time::timeout`.
    pub async fn content_to_image(
        &self,
        content: &str,
        duration: Option<f64>,
    ) -> Result<Option<EncodedImage>> {
        let response = self
            .invoke(MethodCall::content_to_image(content, duration))
            .await?;
        match response {
            None => Ok(None),
            Some(MethodResponse::Success(bytes)) => Ok(Some(EncodedImage::from_bytes(bytes))),
            Some(MethodResponse::Error { code, message }) => Err(error_from_code(&code, message)),
            Some(MethodResponse::NotImplemented) => {
                Err(Error::Other("contentToImage not implemented".into()))
            }
        }
    }

    /// Create (or replace) a preview view. Returns whether a surface was attached.
    pub async fn create_preview(
        &self,
        view_id: i64,
        args: Option<serde_json::Value>,
    ) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::CreatePreview(view_id, args, tx))
            .map_err(|_| Error::HostUnavailable("UI thread has shut down".into()))?;
        rx.await
            .map_err(|e| Error::HostUnavailable(format!("CreatePreview canceled: {}", e)))
    }

    /// Dispose a preview view. Returns whether the view existed.
    pub async fn dispose_preview(&self, view_id: i64) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DisposePreview(view_id, tx))
            .map_err(|_| Error::HostUnavailable("UI thread has shut down".into()))?;
        rx.await
            .map_err(|e| Error::HostUnavailable(format!("DisposePreview canceled: {}", e)))
    }

    /// Dispose all surfaces and stop the UI thread. Returns the number of
    /// captures that were still in flight.
    pub async fn shutdown(self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown(tx))
            .map_err(|_| Error::HostUnavailable("UI thread has shut down".into()))?;
        rx.await
            .map_err(|e| Error::HostUnavailable(format!("Shutdown canceled: {}", e)))
    }
}

fn error_from_code(code: &str, message: String) -> Error {
    match code {
        "invalid-arguments" => Error::InvalidRequest(message),
        "encoding-failure" => Error::EncodingFailure(message),
        "capture-failure" => Error::CaptureFailure(message),
        "surface-error" => Error::Surface(message),
        _ => Error::Other(format!("{}: {}", code, message)),
    }
}

fn ui_thread_main<F>(
    factory: F,
    env: Arc<dyn HostEnvironment>,
    config: CaptureConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    init_tx: oneshot::Sender<Result<()>>,
) where
    F: SurfaceFactory + 'static,
{
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = init_tx.send(Err(Error::HostUnavailable(format!(
                "Failed to build UI event loop: {}",
                e
            ))));
            return;
        }
    };

    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, async move {
        let factory: Rc<dyn SurfaceFactory> = Rc::new(factory);
        let channel = CaptureChannel::new(CapturePipeline::new(factory.clone(), env, config));
        let previews = PreviewViewFactory::new(factory);
        let mut views: HashMap<i64, PreviewView> = HashMap::new();

        let _ = init_tx.send(Ok(()));
        log::debug!(target: TARGET, "UI thread running");

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                Command::Invoke(call, resp) => {
                    channel.handle(call, Box::new(OneshotResponder::new(resp)));
                }
                Command::CreatePreview(view_id, args, resp) => {
                    let view = previews.create(view_id, args.as_ref());
                    let attached = view.is_attached();
                    if let Some(mut old) = views.insert(view_id, view) {
                        old.dispose();
                    }
                    let _ = resp.send(attached);
                }
                Command::DisposePreview(view_id, resp) => {
                    let existed = match views.remove(&view_id) {
                        Some(mut view) => {
                            view.dispose();
                            true
                        }
                        None => false,
                    };
                    let _ = resp.send(existed);
                }
                Command::Shutdown(resp) => {
                    let in_flight = channel.dispose_all();
                    for (_, mut view) in views.drain() {
                        view.dispose();
                    }
                    log::debug!(
                        target: TARGET,
                        "UI thread stopping, {} captures cancelled",
                        in_flight
                    );
                    let _ = resp.send(in_flight);
                    break;
                }
            }
        }
    });
}
