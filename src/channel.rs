//! Capture RPC boundary.
//!
//! A single command, `contentToImage`, is understood. Its reply is the PNG
//! payload; any other command name is answered with "not implemented".

use crate::capture::{CaptureCanceller, CapturePipeline};
use crate::request::CaptureRequest;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tokio::sync::oneshot;

const TARGET: &str = "printraster::channel";

/// Channel name the capture command is served on
pub const CHANNEL_NAME: &str = "printraster";

/// The capture command
pub const CONTENT_TO_IMAGE: &str = "contentToImage";

/// An incoming command with its loosely typed arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Build a `contentToImage` call
    pub fn content_to_image(content: &str, duration: Option<f64>) -> Self {
        Self::new(
            CONTENT_TO_IMAGE,
            serde_json::json!({ "content": content, "duration": duration }),
        )
    }
}

/// Reply to a `MethodCall`
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Vec<u8>),
    Error { code: String, message: String },
    NotImplemented,
}

/// Sink for a single reply. Every method consumes the responder, so a call
/// can be answered at most once.
pub trait Responder {
    fn success(self: Box<Self>, bytes: Vec<u8>);
    fn error(self: Box<Self>, code: &str, message: &str);
    fn not_implemented(self: Box<Self>);
}

/// Forwards the reply over a oneshot channel.
///
/// Dropping it without replying closes the channel, which is how the
/// receiving side learns that no result will come.
pub struct OneshotResponder {
    tx: oneshot::Sender<MethodResponse>,
}

impl OneshotResponder {
    pub fn new(tx: oneshot::Sender<MethodResponse>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Self, oneshot::Receiver<MethodResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }
}

impl Responder for OneshotResponder {
    fn success(self: Box<Self>, bytes: Vec<u8>) {
        let _ = self.tx.send(MethodResponse::Success(bytes));
    }

    fn error(self: Box<Self>, code: &str, message: &str) {
        let _ = self.tx.send(MethodResponse::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    fn not_implemented(self: Box<Self>) {
        let _ = self.tx.send(MethodResponse::NotImplemented);
    }
}

#[derive(Debug, Deserialize)]
struct CaptureArguments {
    content: String,
    #[serde(default)]
    duration: Option<f64>,
}

/// Parse `contentToImage` arguments into a request
pub fn parse_capture_arguments(arguments: serde_json::Value) -> Result<CaptureRequest> {
    let args: CaptureArguments = serde_json::from_value(arguments)
        .map_err(|e| Error::InvalidRequest(format!("bad {} arguments: {}", CONTENT_TO_IMAGE, e)))?;
    CaptureRequest::with_duration(args.content, args.duration)
}

/// Dispatches method calls to a capture pipeline. Lives on the UI thread.
pub struct CaptureChannel {
    pipeline: CapturePipeline,
    in_flight: RefCell<Vec<CaptureCanceller>>,
}

impl CaptureChannel {
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            pipeline,
            in_flight: RefCell::new(Vec::new()),
        }
    }

    /// Handle one call. The responder is answered at most once, possibly
    /// after this returns; it is dropped unanswered when a capture ends
    /// without a result.
    pub fn handle(&self, call: MethodCall, responder: Box<dyn Responder>) {
        if call.method != CONTENT_TO_IMAGE {
            log::debug!(target: TARGET, "{} is not implemented", call.method);
            responder.not_implemented();
            return;
        }

        let request = match parse_capture_arguments(call.arguments) {
            Ok(r) => r,
            Err(e) => {
                log::warn!(target: TARGET, "rejecting {}: {}", CONTENT_TO_IMAGE, e);
                responder.error(e.code(), &e.to_string());
                return;
            }
        };

        let task = match self.pipeline.capture(request) {
            Ok(t) => t,
            Err(e) => {
                log::error!(target: TARGET, "capture could not start: {}", e);
                responder.error(e.code(), &e.to_string());
                return;
            }
        };

        {
            let mut in_flight = self.in_flight.borrow_mut();
            in_flight.retain(|c| c.is_active());
            in_flight.push(task.canceller());
        }

        tokio::task::spawn_local(async move {
            match task.outcome().await {
                Ok(Some(image)) => responder.success(image.into_bytes()),
                Ok(None) => {
                    log::debug!(target: TARGET, "capture finished without a result");
                }
                Err(e) => {
                    log::warn!(target: TARGET, "capture failed: {}", e);
                    responder.error(e.code(), &e.to_string());
                }
            }
        });
    }

    /// Captures whose surface is still alive
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .borrow()
            .iter()
            .filter(|c| c.is_active())
            .count()
    }

    /// Dispose every in-flight surface. Returns how many were still alive.
    pub fn dispose_all(&self) -> usize {
        self.in_flight
            .borrow_mut()
            .drain(..)
            .filter(|c| c.dispose())
            .count()
    }
}
