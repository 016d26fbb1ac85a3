// SPDX-License-Identifier: GPL-3.0-only

//! Capture session abstraction
//!
//! The picker never talks to camera hardware directly. It drives a
//! [`CaptureSessionProvider`], which owns the live feed and performs still
//! captures, possibly on its own worker threads.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐
//! │ CapturePickerWorkflow  │  ← single writer, control thread
//! └───────────┬────────────┘
//!             │ start_preview / capture_still(CaptureReply)
//!             ▼
//! ┌────────────────────────┐
//! │ CaptureSessionProvider │  ← common interface
//! └───────────┬────────────┘
//!             │
//!             ▼
//!     ┌───────────────┐
//!     │ VirtualCamera │  ← synthetic implementation
//!     └───────────────┘
//! ```
//!
//! Capture results travel back through a [`CaptureReply`], which can be
//! consumed exactly once. The reply enqueues the outcome on the workflow's
//! event queue so the transition is applied on the control thread.

pub mod types;

pub use types::*;

/// Identifier of a single still-capture request
pub type CaptureRequestId = u64;

type DeliverFn = Box<dyn FnOnce(CaptureRequestId, BackendResult<CameraFrame>) + Send>;

/// One-shot completion handle for a still capture
///
/// Providers may move this to a worker thread. Consuming it with
/// [`succeed`](Self::succeed) or [`fail`](Self::fail) hands the outcome back to
/// whoever issued the request; dropping it without completing leaves the
/// request outstanding.
pub struct CaptureReply {
    request: CaptureRequestId,
    facing: CameraFacing,
    deliver: DeliverFn,
}

impl CaptureReply {
    pub fn new<F>(request: CaptureRequestId, facing: CameraFacing, deliver: F) -> Self
    where
        F: FnOnce(CaptureRequestId, BackendResult<CameraFrame>) + Send + 'static,
    {
        Self {
            request,
            facing,
            deliver: Box::new(deliver),
        }
    }

    /// Request this reply answers
    pub fn request(&self) -> CaptureRequestId {
        self.request
    }

    /// Camera facing that was active when the capture was requested
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Report a captured frame
    pub fn succeed(self, frame: CameraFrame) {
        self.complete(Ok(frame));
    }

    /// Report a failed capture
    pub fn fail(self, error: BackendError) {
        self.complete(Err(error));
    }

    /// Report the outcome
    pub fn complete(self, outcome: BackendResult<CameraFrame>) {
        (self.deliver)(self.request, outcome);
    }
}

impl std::fmt::Debug for CaptureReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureReply")
            .field("request", &self.request)
            .field("facing", &self.facing)
            .finish_non_exhaustive()
    }
}

/// Camera session provider
///
/// Implementations provide:
/// - Session lifecycle (start and stop the live preview)
/// - Still capture, reported asynchronously through a [`CaptureReply`]
/// - Camera facing availability and switching
/// - A preview frame stream for a [`PreviewSurface`](crate::preview::PreviewSurface)
pub trait CaptureSessionProvider: Send {
    // ===== Lifecycle =====

    /// Start (or restart) the live preview on the given camera
    ///
    /// Calling this while already running must be harmless.
    ///
    /// # Returns
    /// * `Ok(())` - Preview is running
    /// * `Err(BackendError)` - Camera unavailable, access denied, etc.
    fn start_preview(&mut self, facing: CameraFacing) -> BackendResult<()>;

    /// Stop the live preview and release the camera
    fn stop_preview(&mut self);

    /// Check if the preview is running
    fn is_running(&self) -> bool;

    // ===== Capture =====

    /// Capture a single still image
    ///
    /// The provider must eventually consume `reply` exactly once, either
    /// inline or from a worker thread. Immediate failures are reported through
    /// the reply too.
    fn capture_still(&mut self, reply: CaptureReply);

    // ===== Cameras =====

    /// Whether a camera with this facing exists
    fn has_camera(&self, facing: CameraFacing) -> bool;

    /// Switch the running preview to another camera
    fn switch_facing(&mut self, facing: CameraFacing) -> BackendResult<()>;

    /// Currently active facing, if the session is running
    fn current_facing(&self) -> Option<CameraFacing>;

    // ===== Preview =====

    /// Take the receiver for preview frames
    ///
    /// # Returns
    /// * `Some(FrameReceiver)` - Stream of preview frames
    /// * `None` - Not running, or the receiver was already taken
    fn preview_receiver(&mut self) -> Option<FrameReceiver>;
}

impl<P: CaptureSessionProvider + ?Sized> CaptureSessionProvider for Box<P> {
    fn start_preview(&mut self, facing: CameraFacing) -> BackendResult<()> {
        (**self).start_preview(facing)
    }

    fn stop_preview(&mut self) {
        (**self).stop_preview()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn capture_still(&mut self, reply: CaptureReply) {
        (**self).capture_still(reply)
    }

    fn has_camera(&self, facing: CameraFacing) -> bool {
        (**self).has_camera(facing)
    }

    fn switch_facing(&mut self, facing: CameraFacing) -> BackendResult<()> {
        (**self).switch_facing(facing)
    }

    fn current_facing(&self) -> Option<CameraFacing> {
        (**self).current_facing()
    }

    fn preview_receiver(&mut self) -> Option<FrameReceiver> {
        (**self).preview_receiver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reply_delivers_once_with_request_id() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reply = CaptureReply::new(7, CameraFacing::Front, move |id, outcome| {
            sink.lock().unwrap().push((id, outcome.is_ok()));
        });

        assert_eq!(reply.request(), 7);
        assert_eq!(reply.facing(), CameraFacing::Front);
        reply.fail(BackendError::Busy);

        assert_eq!(*seen.lock().unwrap(), vec![(7, false)]);
    }
}
