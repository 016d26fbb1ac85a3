// SPDX-License-Identifier: GPL-3.0-only

//! Picker states and the events that move between them

use crate::backends::camera::{BackendResult, CameraFrame, CaptureRequestId};
use tokio::sync::mpsc::UnboundedSender;

/// Externally visible picker state
///
/// Exactly one is active at a time. `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PickerState {
    /// Live preview, waiting for a trigger
    #[default]
    Previewing,
    /// A still capture is outstanding
    Capturing,
    /// A captured image waits for confirm or retake
    Confirming,
    /// The user backed out (terminal)
    Cancelled,
    /// An image was delivered (terminal)
    Confirmed,
}

impl PickerState {
    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PickerState::Cancelled | PickerState::Confirmed)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PickerState::Previewing => "Previewing",
            PickerState::Capturing => "Capturing",
            PickerState::Confirming => "Confirming",
            PickerState::Cancelled => "Cancelled",
            PickerState::Confirmed => "Confirmed",
        }
    }
}

impl std::fmt::Display for PickerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What started a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// On-screen capture button
    CaptureButton,
    /// Hardware volume button (honored only when the flag allows it)
    VolumeButton,
}

/// Input to the picker state machine
pub enum PickerEvent {
    /// Start a capture
    TriggerCapture(TriggerSource),
    /// A provider finished (or failed) the still capture `request`
    CaptureCompleted {
        request: CaptureRequestId,
        outcome: BackendResult<CameraFrame>,
    },
    /// Accept the pending image
    Confirm,
    /// Discard the pending image and go back to preview
    Retake,
    /// Abandon the picker
    Cancel,
    /// Flip between back and front camera
    ToggleCamera,
    /// Queued by the workflow itself when auto-retake is on. Applies only if
    /// the image from `request` is still pending.
    AutoRetake { request: CaptureRequestId },
}

impl PickerEvent {
    pub fn capture_succeeded(request: CaptureRequestId, frame: CameraFrame) -> Self {
        PickerEvent::CaptureCompleted {
            request,
            outcome: Ok(frame),
        }
    }

    pub fn capture_failed(
        request: CaptureRequestId,
        error: crate::backends::camera::BackendError,
    ) -> Self {
        PickerEvent::CaptureCompleted {
            request,
            outcome: Err(error),
        }
    }
}

impl std::fmt::Debug for PickerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerEvent::TriggerCapture(source) => write!(f, "TriggerCapture({:?})", source),
            PickerEvent::CaptureCompleted { request, outcome } => match outcome {
                Ok(frame) => write!(
                    f,
                    "CaptureSucceeded {{ request: {}, {}x{} }}",
                    request, frame.width, frame.height
                ),
                Err(e) => write!(f, "CaptureFailed {{ request: {}, error: {} }}", request, e),
            },
            PickerEvent::Confirm => write!(f, "Confirm"),
            PickerEvent::Retake => write!(f, "Retake"),
            PickerEvent::Cancel => write!(f, "Cancel"),
            PickerEvent::ToggleCamera => write!(f, "ToggleCamera"),
            PickerEvent::AutoRetake { request } => write!(f, "AutoRetake {{ request: {} }}", request),
        }
    }
}

/// Cloneable handle for queueing events from other threads
///
/// Events are applied when the owner pumps the workflow.
#[derive(Debug, Clone)]
pub struct PickerEventSender {
    tx: UnboundedSender<PickerEvent>,
}

impl PickerEventSender {
    pub(crate) fn new(tx: UnboundedSender<PickerEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event. Returns false if the workflow is gone.
    pub fn send(&self, event: PickerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn trigger(&self) -> bool {
        self.send(PickerEvent::TriggerCapture(TriggerSource::CaptureButton))
    }

    pub fn confirm(&self) -> bool {
        self.send(PickerEvent::Confirm)
    }

    pub fn retake(&self) -> bool {
        self.send(PickerEvent::Retake)
    }

    pub fn cancel(&self) -> bool {
        self.send(PickerEvent::Cancel)
    }

    pub fn toggle_camera(&self) -> bool {
        self.send(PickerEvent::ToggleCamera)
    }
}
