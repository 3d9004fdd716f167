//! Scripted rendering surface shared by the integration tests
#![allow(dead_code)]

use printraster::capture::{CaptureCanceller, RasterImage};
use printraster::channel::{MethodResponse, Responder};
use printraster::surface::{RenderingSurface, ScriptFuture, SurfaceFactory, SurfaceSettings};
use printraster::{Error, Result, Viewport};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::oneshot;

/// What the scripted surface does and what happened to it
#[derive(Default)]
pub struct Probe {
    pub events: Vec<String>,
    pub created: u32,
    pub destroyed: u32,
    /// Disposed from inside a pending evaluation, see `Script::dispose_during`
    pub canceller: Option<CaptureCanceller>,
    load_tx: Option<oneshot::Sender<()>>,
}

pub type ProbeRef = Rc<RefCell<Probe>>;

pub fn probe() -> ProbeRef {
    Rc::new(RefCell::new(Probe::default()))
}

impl Probe {
    pub fn has(&self, prefix: &str) -> bool {
        self.events.iter().any(|e| e.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Fire the pending load-complete event. Returns false if nobody is listening.
pub fn finish_load(probe: &ProbeRef) -> bool {
    let tx = probe.borrow_mut().load_tx.take();
    match tx {
        Some(tx) => tx.send(()).is_ok(),
        None => false,
    }
}

#[derive(Clone)]
pub struct Script {
    pub width: Option<String>,
    pub height: Option<String>,
    /// Complete loading as soon as markup is loaded
    pub auto_load: bool,
    pub fail_load: bool,
    pub fill: [u8; 4],
    /// Dispose the capture while evaluating this expression
    pub dispose_during: Option<&'static str>,
}

impl Script {
    pub fn sized(width: &str, height: &str) -> Self {
        Self {
            width: Some(width.to_string()),
            height: Some(height.to_string()),
            auto_load: true,
            fail_load: false,
            fill: [10, 20, 30, 255],
            dispose_during: None,
        }
    }

    pub fn manual_load(mut self) -> Self {
        self.auto_load = false;
        self
    }
}

pub struct ScriptedSurface {
    probe: ProbeRef,
    script: Script,
}

impl ScriptedSurface {
    fn log(&self, event: String) {
        self.probe.borrow_mut().events.push(event);
    }
}

impl RenderingSurface for ScriptedSurface {
    fn layout(&mut self, viewport: Viewport) {
        self.log(format!("layout {}x{}", viewport.width, viewport.height));
    }

    fn apply_settings(&mut self, settings: &SurfaceSettings) {
        self.log(format!(
            "settings js={} files={}",
            settings.javascript_enabled, settings.allow_file_access
        ));
    }

    fn on_load_complete(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.probe.borrow_mut().load_tx = Some(tx);
        self.log("listen".into());
        rx
    }

    fn load_markup(&mut self, markup: &str, document_type: &str, encoding: &str) -> Result<()> {
        self.log(format!("load {} {} {}", document_type, encoding, markup));
        if self.script.fail_load {
            return Err(Error::Surface("refused".into()));
        }
        if self.script.auto_load {
            finish_load(&self.probe);
        }
        Ok(())
    }

    fn evaluate_script(&mut self, expression: &str) -> ScriptFuture {
        self.log(format!("eval {}", expression));
        let value = if expression.contains("Width") {
            self.script.width.clone()
        } else {
            self.script.height.clone()
        };
        let probe = self.probe.clone();
        let expression = expression.to_string();
        let dispose = self.script.dispose_during == Some(expression.as_str());
        Box::pin(async move {
            // resolve on a later poll, like a real script channel
            tokio::task::yield_now().await;
            if dispose {
                let canceller = probe.borrow_mut().canceller.take();
                if let Some(c) = canceller {
                    c.dispose();
                }
            }
            probe
                .borrow_mut()
                .events
                .push(format!("resolved {}", expression));
            Ok(value)
        })
    }

    fn measure_unconstrained(&mut self) {
        self.log("measure".into());
    }

    fn draw(&mut self, target: &mut RasterImage) -> Result<()> {
        self.log(format!("draw {}x{}", target.width(), target.height()));
        target.fill(self.script.fill);
        Ok(())
    }

    fn destroy(&mut self) {
        self.log("destroy".into());
        let mut probe = self.probe.borrow_mut();
        probe.destroyed += 1;
        // listeners go away with the surface
        probe.load_tx = None;
    }
}

pub fn factory(probe: &ProbeRef, script: Script) -> Rc<dyn SurfaceFactory> {
    let probe = probe.clone();
    Rc::new(move || -> Result<Box<dyn RenderingSurface>> {
        probe.borrow_mut().created += 1;
        Ok(Box::new(ScriptedSurface {
            probe: probe.clone(),
            script: script.clone(),
        }))
    })
}

/// Responder that records replies for later inspection
pub struct RecordingResponder {
    pub replies: Rc<RefCell<Vec<MethodResponse>>>,
}

impl RecordingResponder {
    pub fn new() -> (Box<Self>, Rc<RefCell<Vec<MethodResponse>>>) {
        let replies = Rc::new(RefCell::new(Vec::new()));
        (
            Box::new(Self {
                replies: replies.clone(),
            }),
            replies,
        )
    }
}

impl Responder for RecordingResponder {
    fn success(self: Box<Self>, bytes: Vec<u8>) {
        self.replies.borrow_mut().push(MethodResponse::Success(bytes));
    }

    fn error(self: Box<Self>, code: &str, message: &str) {
        self.replies.borrow_mut().push(MethodResponse::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    fn not_implemented(self: Box<Self>) {
        self.replies.borrow_mut().push(MethodResponse::NotImplemented);
    }
}
