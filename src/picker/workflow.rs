// SPDX-License-Identifier: GPL-3.0-only

//! Capture picker workflow
//!
//! Drives one picker activation from live preview to exactly one outcome:
//! a confirmed image or a cancellation.
//!
//! ```text
//!              trigger                 success (editing)
//! Previewing ───────────▶ Capturing ───────────────────▶ Confirming
//!     ▲  ▲                   │  │                          │   │
//!     │  └───── failure ─────┘  │ success (no editing)     │   │ confirm
//!     │                         ▼                          │   ▼
//!     │                     Confirmed ◀────────────────────┼───┘
//!     └────────────── retake / auto-retake ────────────────┘
//!
//! cancel from any non-terminal state ─▶ Cancelled
//! ```
//!
//! All transitions run in [`CapturePickerWorkflow::handle`], which takes
//! `&mut self`, so there is exactly one writer. Anything that happens
//! elsewhere (control taps, provider completions on worker threads) only
//! queues a [`PickerEvent`]; the owner applies the queue with
//! [`pump`](CapturePickerWorkflow::pump) or
//! [`process_next`](CapturePickerWorkflow::process_next).

use super::delegate::{DelegateHandle, PickerDelegate};
use super::state::{PickerEvent, PickerEventSender, PickerState, TriggerSource};
use super::{CaptureResult, PickerId};
use crate::backends::camera::{
    BackendResult, CameraFacing, CameraFrame, CaptureReply, CaptureRequestId,
    CaptureSessionProvider, FrameReceiver,
};
use crate::config::FeatureFlags;
use crate::controls::{ActionSource, CaptureButton, ControlEvent, SubscriptionId};
use crate::errors::{PickerError, PickerResult};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Internal stage; [`PickerState`] is its public projection
enum Stage {
    Previewing,
    Capturing { request: CaptureRequestId },
    Confirming { pending: CaptureResult },
    Confirmed,
    Cancelled,
}

impl Stage {
    fn state(&self) -> PickerState {
        match self {
            Stage::Previewing => PickerState::Previewing,
            Stage::Capturing { .. } => PickerState::Capturing,
            Stage::Confirming { .. } => PickerState::Confirming,
            Stage::Confirmed => PickerState::Confirmed,
            Stage::Cancelled => PickerState::Cancelled,
        }
    }
}

/// The picker state machine
pub struct CapturePickerWorkflow<P: CaptureSessionProvider> {
    id: PickerId,
    flags: FeatureFlags,
    provider: P,
    delegate: DelegateHandle,
    stage: Stage,
    active: bool,
    facing: CameraFacing,
    next_request: CaptureRequestId,
    events_tx: UnboundedSender<PickerEvent>,
    events_rx: UnboundedReceiver<PickerEvent>,
    capture_button: CaptureButton,
    button_subscription: SubscriptionId,
}

impl<P: CaptureSessionProvider> CapturePickerWorkflow<P> {
    /// Create an inactive workflow; call [`activate`](Self::activate) to start
    pub fn new(provider: P, flags: FeatureFlags) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let capture_button = CaptureButton::new();
        capture_button.control().set_enabled(false);
        let button_subscription =
            capture_button.subscribe(trigger_handler(&events_tx, TriggerSource::CaptureButton));

        let id = PickerId::new();
        debug!(picker = %id, ?flags, "Created capture picker");

        Self {
            id,
            flags,
            provider,
            delegate: DelegateHandle::none(),
            stage: Stage::Previewing,
            active: false,
            facing: CameraFacing::Back,
            next_request: 1,
            events_tx,
            events_rx,
            capture_button,
            button_subscription,
        }
    }

    /// Builder: attach a delegate (held weakly)
    pub fn with_delegate<D: PickerDelegate + 'static>(mut self, delegate: &Arc<D>) -> Self {
        self.set_delegate(delegate);
        self
    }

    /// Builder: camera to open on activation
    pub fn with_initial_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    pub fn set_delegate<D: PickerDelegate + 'static>(&mut self, delegate: &Arc<D>) {
        self.delegate = DelegateHandle::new(delegate);
    }

    pub fn set_delegate_weak(&mut self, delegate: Weak<dyn PickerDelegate>) {
        self.delegate = DelegateHandle::from_weak(delegate);
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = DelegateHandle::none();
    }

    // ===== Accessors =====

    pub fn id(&self) -> PickerId {
        self.id
    }

    pub fn state(&self) -> PickerState {
        self.stage.state()
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// Camera facing in use (or to be used on activation)
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reached `Confirmed` or `Cancelled`
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Image awaiting confirmation, if any
    pub fn pending_image(&self) -> Option<&CaptureResult> {
        match &self.stage {
            Stage::Confirming { pending } => Some(pending),
            _ => None,
        }
    }

    /// The capture trigger control, for host customization
    pub fn capture_button(&self) -> &CaptureButton {
        &self.capture_button
    }

    pub fn capture_button_mut(&mut self) -> &mut CaptureButton {
        &mut self.capture_button
    }

    /// Handle for queueing events from other threads or callbacks
    pub fn event_sender(&self) -> PickerEventSender {
        PickerEventSender::new(self.events_tx.clone())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Take the provider's preview stream for a preview surface
    pub fn preview_receiver(&mut self) -> Option<FrameReceiver> {
        self.provider.preview_receiver()
    }

    /// Route a hardware volume button into the picker
    ///
    /// Presses are ignored unless `volume_button_takes_picture` is set.
    /// Unsubscribe through the source with the returned id.
    pub fn attach_volume_button(&self, source: &dyn ActionSource) -> SubscriptionId {
        source.subscribe(trigger_handler(&self.events_tx, TriggerSource::VolumeButton))
    }

    // ===== Lifecycle =====

    /// Start the camera session and enter `Previewing`
    ///
    /// On failure the workflow stays inert and ignores every event except
    /// cancel until a later activation succeeds. Activating a finished workflow does nothing.
    pub fn activate(&mut self) -> PickerResult<()> {
        if self.is_finished() {
            warn!(picker = %self.id, state = %self.state(), "Picker already finished, not activating");
            return Ok(());
        }
        if self.active {
            return Ok(());
        }

        self.facing = self.resolve_facing(self.facing);
        info!(picker = %self.id, facing = %self.facing, "Activating capture picker");

        if let Err(e) = self.provider.start_preview(self.facing) {
            warn!(picker = %self.id, error = %e, "Camera session failed to start");
            self.active = false;
            self.sync_button();
            return Err(PickerError::SessionStart(e));
        }

        self.active = true;
        self.sync_button();
        Ok(())
    }

    /// Stop the camera session
    ///
    /// The state is kept; a later [`activate`](Self::activate) resumes.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        info!(picker = %self.id, state = %self.state(), "Deactivating capture picker");
        self.provider.stop_preview();
        self.active = false;
        self.sync_button();
    }

    // ===== Event processing =====

    /// Apply every queued event without blocking
    ///
    /// Stops at the first error and returns it; later events stay queued.
    /// Returns the number of events applied otherwise.
    pub fn pump(&mut self) -> PickerResult<usize> {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            applied += 1;
            self.handle(event)?;
        }
        Ok(applied)
    }

    /// Wait for the next queued event without applying it
    ///
    /// The workflow holds a sender itself, so this only returns `None` if the
    /// queue is torn down.
    pub async fn next_event(&mut self) -> Option<PickerEvent> {
        self.events_rx.recv().await
    }

    /// Wait for the next queued event and apply it
    pub async fn process_next(&mut self) -> PickerResult<()> {
        if let Some(event) = self.next_event().await {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Apply one event
    ///
    /// Events that have no transition from the current state are ignored.
    /// Capture and session failures are returned here, not sent to the
    /// delegate.
    pub fn handle(&mut self, event: PickerEvent) -> PickerResult<()> {
        // Cancel still reaches an inactive picker so the host gets an outcome
        if !self.active && !matches!(event, PickerEvent::Cancel) {
            debug!(picker = %self.id, ?event, "Picker inactive, ignoring event");
            return Ok(());
        }

        let before = self.stage.state();
        let current = std::mem::replace(&mut self.stage, Stage::Cancelled);

        let (next, result) = match (current, event) {
            (Stage::Previewing, PickerEvent::TriggerCapture(source)) => {
                if self.accepts_trigger(source) {
                    self.begin_capture(source)
                } else {
                    debug!(?source, "Trigger source disabled, ignoring");
                    (Stage::Previewing, Ok(()))
                }
            }
            (Stage::Capturing { request }, PickerEvent::CaptureCompleted { request: done, outcome })
                if done == request =>
            {
                self.finish_capture(request, outcome)
            }
            (Stage::Confirming { pending }, PickerEvent::Confirm) => self.confirm(pending),
            (Stage::Confirming { pending }, PickerEvent::Retake) => self.retake(pending),
            (Stage::Confirming { pending }, PickerEvent::AutoRetake { request })
                if pending.request() == request =>
            {
                debug!(request, "Auto-retake discarding capture");
                self.retake(pending)
            }
            (
                Stage::Previewing | Stage::Capturing { .. } | Stage::Confirming { .. },
                PickerEvent::Cancel,
            ) => self.cancel(),
            (Stage::Previewing, PickerEvent::ToggleCamera) => {
                self.toggle_camera();
                (Stage::Previewing, Ok(()))
            }
            (stage, event) => {
                debug!(state = %stage.state(), ?event, "No transition, ignoring event");
                (stage, Ok(()))
            }
        };

        self.stage = next;
        let after = self.stage.state();
        if before != after {
            info!(picker = %self.id, from = %before, to = %after, "Picker state changed");
        }
        self.sync_button();
        result
    }

    // ===== Transitions =====

    fn accepts_trigger(&self, source: TriggerSource) -> bool {
        match source {
            TriggerSource::CaptureButton => true,
            TriggerSource::VolumeButton => self.flags.volume_button_takes_picture,
        }
    }

    fn begin_capture(&mut self, source: TriggerSource) -> (Stage, PickerResult<()>) {
        let request = self.next_request;
        self.next_request += 1;

        info!(picker = %self.id, request, ?source, facing = %self.facing, "Capturing still");

        let tx = self.events_tx.clone();
        let reply = CaptureReply::new(request, self.facing, move |request, outcome| {
            // Workflow gone: nobody is waiting for this capture any more
            let _ = tx.send(PickerEvent::CaptureCompleted { request, outcome });
        });
        self.provider.capture_still(reply);

        (Stage::Capturing { request }, Ok(()))
    }

    fn finish_capture(
        &mut self,
        request: CaptureRequestId,
        outcome: BackendResult<CameraFrame>,
    ) -> (Stage, PickerResult<()>) {
        let result = match outcome.and_then(|frame| CaptureResult::from_frame(request, frame)) {
            Ok(result) => result,
            Err(e) => {
                warn!(picker = %self.id, request, error = %e, "Still capture failed");
                return match self.enter_previewing() {
                    Ok(()) => (Stage::Previewing, Err(PickerError::Capture(e))),
                    Err(start) => (Stage::Previewing, Err(start)),
                };
            }
        };

        let (width, height) = result.dimensions();
        info!(picker = %self.id, request, width, height, "Still captured");
        self.delegate.did_capture_image(self.id, &result);

        if !self.flags.editing_enabled {
            info!(picker = %self.id, request, "Editing disabled, confirming capture");
            self.delegate.did_confirm_image(self.id, result);
            return (Stage::Confirmed, Ok(()));
        }

        if self.flags.auto_retake_active() {
            // Queued behind anything the user already did
            let _ = self.events_tx.send(PickerEvent::AutoRetake { request });
        }

        (Stage::Confirming { pending: result }, Ok(()))
    }

    fn confirm(&mut self, pending: CaptureResult) -> (Stage, PickerResult<()>) {
        info!(picker = %self.id, request = pending.request(), "Capture confirmed");
        self.delegate.did_confirm_image(self.id, pending);
        (Stage::Confirmed, Ok(()))
    }

    fn retake(&mut self, pending: CaptureResult) -> (Stage, PickerResult<()>) {
        debug!(picker = %self.id, request = pending.request(), "Discarding capture");
        drop(pending);
        (Stage::Previewing, self.enter_previewing())
    }

    fn cancel(&mut self) -> (Stage, PickerResult<()>) {
        info!(picker = %self.id, "Picker cancelled");
        self.delegate.picker_did_cancel(self.id);
        (Stage::Cancelled, Ok(()))
    }

    fn toggle_camera(&mut self) {
        if !self.flags.front_camera_enabled {
            debug!("Front camera disabled, ignoring toggle");
            return;
        }

        let target = self.facing.flipped();
        if !self.provider.has_camera(target) {
            debug!(facing = %target, "No such camera, ignoring toggle");
            return;
        }

        match self.provider.switch_facing(target) {
            Ok(()) => {
                info!(picker = %self.id, facing = %target, "Switched camera");
                self.facing = target;
            }
            Err(e) => warn!(facing = %target, error = %e, "Camera switch failed, keeping current camera"),
        }
    }

    /// (Re)start the preview when going back to `Previewing`
    ///
    /// A failure here leaves the workflow inert.
    fn enter_previewing(&mut self) -> PickerResult<()> {
        self.provider.start_preview(self.facing).map_err(|e| {
            warn!(picker = %self.id, error = %e, "Preview restart failed, picker inert");
            self.active = false;
            PickerError::SessionStart(e)
        })
    }

    /// Closest usable facing to `requested`
    fn resolve_facing(&self, requested: CameraFacing) -> CameraFacing {
        if requested == CameraFacing::Front
            && (!self.flags.front_camera_enabled || !self.provider.has_camera(CameraFacing::Front))
        {
            warn!("Front camera requested but unavailable, using back camera");
            return CameraFacing::Back;
        }
        requested
    }

    /// The capture button works only while a capture could start
    fn sync_button(&self) {
        let enabled = self.active && matches!(self.stage, Stage::Previewing);
        self.capture_button.control().set_enabled(enabled);
    }
}

impl<P: CaptureSessionProvider> Drop for CapturePickerWorkflow<P> {
    fn drop(&mut self) {
        self.capture_button.unsubscribe(self.button_subscription);
    }
}

impl<P: CaptureSessionProvider> std::fmt::Debug for CapturePickerWorkflow<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePickerWorkflow")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("active", &self.active)
            .field("facing", &self.facing)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Control handler that queues a trigger on release
fn trigger_handler(
    tx: &UnboundedSender<PickerEvent>,
    source: TriggerSource,
) -> Arc<dyn Fn(ControlEvent) + Send + Sync> {
    let tx = tx.clone();
    Arc::new(move |event| {
        if event == ControlEvent::TouchUpInside {
            let _ = tx.send(PickerEvent::TriggerCapture(source));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::BackendError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that parks capture replies until the test completes them
    #[derive(Default)]
    struct ManualProvider {
        running: bool,
        starts: usize,
        replies: VecDeque<CaptureReply>,
        refuse_start: bool,
        refuse_switch: bool,
    }

    impl CaptureSessionProvider for ManualProvider {
        fn start_preview(&mut self, _facing: CameraFacing) -> BackendResult<()> {
            if self.refuse_start {
                return Err(BackendError::PermissionDenied);
            }
            self.running = true;
            self.starts += 1;
            Ok(())
        }

        fn stop_preview(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn capture_still(&mut self, reply: CaptureReply) {
            self.replies.push_back(reply);
        }

        fn has_camera(&self, _facing: CameraFacing) -> bool {
            true
        }

        fn switch_facing(&mut self, _facing: CameraFacing) -> BackendResult<()> {
            if self.refuse_switch {
                return Err(BackendError::Busy);
            }
            Ok(())
        }

        fn current_facing(&self) -> Option<CameraFacing> {
            None
        }

        fn preview_receiver(&mut self) -> Option<FrameReceiver> {
            None
        }
    }

    fn frame() -> CameraFrame {
        CameraFrame::from_rgba(2, 2, vec![255; 16], CameraFacing::Back)
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl PickerDelegate for Log {
        fn did_capture_image(&self, _picker: PickerId, picture: &CaptureResult) {
            self.0.lock().unwrap().push(format!("capture {}", picture.request()));
        }
        fn did_confirm_image(&self, _picker: PickerId, picture: CaptureResult) {
            self.0.lock().unwrap().push(format!("confirm {}", picture.request()));
        }
        fn picker_did_cancel(&self, _picker: PickerId) {
            self.0.lock().unwrap().push("cancel".into());
        }
    }

    #[test]
    fn test_events_before_activation_are_ignored() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();
        assert_eq!(picker.state(), PickerState::Previewing);
        assert!(picker.provider().replies.is_empty());
        assert!(!picker.capture_button().is_enabled());
    }

    #[test]
    fn test_second_trigger_while_capturing_is_ignored() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();

        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();

        assert_eq!(picker.state(), PickerState::Capturing);
        assert_eq!(picker.provider().replies.len(), 1);
        assert!(!picker.capture_button().is_enabled());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();

        picker.handle(PickerEvent::capture_succeeded(99, frame())).unwrap();
        assert_eq!(picker.state(), PickerState::Capturing);
    }

    #[test]
    fn test_button_tap_goes_through_queue() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();

        assert!(picker.capture_button().tap());
        assert_eq!(picker.state(), PickerState::Previewing);
        assert_eq!(picker.pump().unwrap(), 1);
        assert_eq!(picker.state(), PickerState::Capturing);
    }

    #[test]
    fn test_reply_completion_reaches_delegate_after_pump() {
        let log = Arc::new(Log::default());
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default())
            .with_delegate(&log);
        picker.activate().unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();

        let reply = picker.provider_mut().replies.pop_front().unwrap();
        std::thread::spawn(move || reply.succeed(frame())).join().unwrap();

        picker.pump().unwrap();
        assert_eq!(picker.state(), PickerState::Confirming);
        assert_eq!(*log.0.lock().unwrap(), vec!["capture 1".to_string()]);
        assert!(picker.pending_image().is_some());
    }

    #[test]
    fn test_capture_failure_restarts_preview() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();

        let err = picker
            .handle(PickerEvent::capture_failed(1, BackendError::Busy))
            .unwrap_err();

        assert!(matches!(err, PickerError::Capture(BackendError::Busy)));
        assert_eq!(picker.state(), PickerState::Previewing);
        assert_eq!(picker.provider().starts, 2);
        assert!(picker.is_active());
        assert!(picker.capture_button().is_enabled());
    }

    #[test]
    fn test_deactivate_stops_session_and_keeps_state() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();
        picker.handle(PickerEvent::capture_succeeded(1, frame())).unwrap();

        picker.deactivate();
        assert!(!picker.provider().is_running());
        assert_eq!(picker.state(), PickerState::Confirming);

        picker.activate().unwrap();
        picker.handle(PickerEvent::Confirm).unwrap();
        assert_eq!(picker.state(), PickerState::Confirmed);
    }

    #[test]
    fn test_failed_switch_keeps_facing() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();
        picker.provider_mut().refuse_switch = true;

        picker.handle(PickerEvent::ToggleCamera).unwrap();
        assert_eq!(picker.facing(), CameraFacing::Back);

        picker.provider_mut().refuse_switch = false;
        picker.handle(PickerEvent::ToggleCamera).unwrap();
        assert_eq!(picker.facing(), CameraFacing::Front);
    }

    #[test]
    fn test_failed_preview_restart_goes_inert() {
        let log = Arc::new(Log::default());
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default())
            .with_delegate(&log);
        picker.activate().unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();
        picker.handle(PickerEvent::capture_succeeded(1, frame())).unwrap();

        picker.provider_mut().refuse_start = true;
        let err = picker.handle(PickerEvent::Retake).unwrap_err();

        assert!(matches!(err, PickerError::SessionStart(BackendError::PermissionDenied)));
        assert_eq!(picker.state(), PickerState::Previewing);
        assert!(!picker.is_active());
        assert!(!picker.capture_button().is_enabled());

        picker.handle(PickerEvent::Retake).unwrap();
        picker.handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton)).unwrap();
        assert_eq!(picker.state(), PickerState::Previewing);

        picker.handle(PickerEvent::Cancel).unwrap();
        assert_eq!(picker.state(), PickerState::Cancelled);
        assert_eq!(picker.provider().starts, 1);

        // Finished: a second cancel reports nothing
        picker.handle(PickerEvent::Cancel).unwrap();
        assert_eq!(*log.0.lock().unwrap(), vec!["capture 1", "cancel"]);
    }

    #[tokio::test]
    async fn test_process_next_applies_queued_event() {
        let mut picker = CapturePickerWorkflow::new(ManualProvider::default(), FeatureFlags::default());
        picker.activate().unwrap();
        let sender = picker.event_sender();

        tokio::spawn(async move {
            sender.cancel();
        });

        picker.process_next().await.unwrap();
        assert_eq!(picker.state(), PickerState::Cancelled);
    }
}
