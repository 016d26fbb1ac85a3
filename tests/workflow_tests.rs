// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture picker workflow

use capture_picker::backends::camera::{
    BackendError, BackendResult, CameraFacing, CaptureReply, CaptureSessionProvider, FrameReceiver,
};
use capture_picker::backends::virtual_camera::{VirtualCameraConfig, VirtualCameraProvider};
use capture_picker::controls::VolumeButton;
use capture_picker::picker::{
    CapturePickerWorkflow, CaptureResult, PickerDelegate, PickerEvent, PickerId, PickerState,
    TriggerSource,
};
use capture_picker::{CameraFrame, FeatureFlags, PickerError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Captured(u64),
    Confirmed(u64),
    Cancelled,
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl PickerDelegate for Recorder {
    fn did_capture_image(&self, _picker: PickerId, picture: &CaptureResult) {
        self.calls.lock().unwrap().push(Call::Captured(picture.request()));
    }

    fn did_confirm_image(&self, _picker: PickerId, picture: CaptureResult) {
        self.calls.lock().unwrap().push(Call::Confirmed(picture.request()));
    }

    fn picker_did_cancel(&self, _picker: PickerId) {
        self.calls.lock().unwrap().push(Call::Cancelled);
    }
}

/// Provider that never completes a capture on its own
#[derive(Default)]
struct ParkedProvider {
    running: bool,
    replies: Vec<CaptureReply>,
}

impl CaptureSessionProvider for ParkedProvider {
    fn start_preview(&mut self, _facing: CameraFacing) -> BackendResult<()> {
        self.running = true;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn capture_still(&mut self, reply: CaptureReply) {
        self.replies.push(reply);
    }

    fn has_camera(&self, facing: CameraFacing) -> bool {
        facing == CameraFacing::Back
    }

    fn switch_facing(&mut self, facing: CameraFacing) -> BackendResult<()> {
        Err(BackendError::DeviceNotFound(facing.to_string()))
    }

    fn current_facing(&self) -> Option<CameraFacing> {
        self.running.then_some(CameraFacing::Back)
    }

    fn preview_receiver(&mut self) -> Option<FrameReceiver> {
        None
    }
}

fn instant_camera() -> VirtualCameraProvider {
    VirtualCameraProvider::new(VirtualCameraConfig {
        width: 32,
        height: 24,
        preview_fps: 30,
        has_front_camera: true,
        capture_latency: Duration::ZERO,
    })
}

fn picker_with(
    flags: FeatureFlags,
) -> (CapturePickerWorkflow<VirtualCameraProvider>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(instant_camera(), flags).with_delegate(&recorder);
    picker.activate().unwrap();
    (picker, recorder)
}

#[test]
fn test_default_flow_captures_then_confirms() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    assert_eq!(picker.state(), PickerState::Previewing);
    assert!(picker.capture_button().is_enabled());

    assert!(picker.capture_button().tap());
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Confirming);
    assert_eq!(recorder.calls(), vec![Call::Captured(1)]);
    assert_eq!(picker.pending_image().map(|p| p.dimensions()), Some((32, 24)));
    assert!(!picker.capture_button().is_enabled());

    picker.event_sender().confirm();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Confirmed);
    assert!(picker.is_finished());
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Confirmed(1)]);

    // Terminal: nothing else happens
    let sender = picker.event_sender();
    sender.trigger();
    sender.cancel();
    sender.retake();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Confirmed);
    assert_eq!(recorder.calls().len(), 2);
}

#[test]
fn test_editing_disabled_confirms_immediately() {
    let flags = FeatureFlags {
        editing_enabled: false,
        ..FeatureFlags::default()
    };
    let (mut picker, recorder) = picker_with(flags);

    picker.capture_button().tap();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Confirmed);
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Confirmed(1)]);
    assert!(picker.pending_image().is_none());
}

#[test]
fn test_auto_retake_loops_back_to_preview() {
    let flags = FeatureFlags {
        auto_retake_enabled: true,
        ..FeatureFlags::default()
    };
    let (mut picker, recorder) = picker_with(flags);

    picker.capture_button().tap();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Previewing);
    assert!(picker.pending_image().is_none());
    assert!(picker.provider().is_running());

    picker.capture_button().tap();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Previewing);
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Captured(2)]);
}

#[test]
fn test_confirm_queued_before_auto_retake_wins() {
    let flags = FeatureFlags {
        auto_retake_enabled: true,
        ..FeatureFlags::default()
    };
    let (mut picker, recorder) = picker_with(flags);

    // Completion is queued inline by the synthetic camera
    picker
        .handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton))
        .unwrap();
    picker.event_sender().confirm();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Confirmed);
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Confirmed(1)]);
}

#[test]
fn test_retake_never_confirms_discarded_image() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());

    picker.capture_button().tap();
    picker.pump().unwrap();
    picker.event_sender().retake();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Previewing);
    assert!(picker.capture_button().is_enabled());

    picker.capture_button().tap();
    picker.pump().unwrap();
    picker.event_sender().confirm();
    picker.pump().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![Call::Captured(1), Call::Captured(2), Call::Confirmed(2)]
    );
}

#[test]
fn test_cancel_while_previewing() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    picker.event_sender().cancel();
    picker.event_sender().cancel();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Cancelled);
    assert_eq!(recorder.calls(), vec![Call::Cancelled]);
}

#[test]
fn test_cancel_while_capturing_ignores_late_completion() {
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(ParkedProvider::default(), FeatureFlags::default())
        .with_delegate(&recorder);
    picker.activate().unwrap();

    picker.capture_button().tap();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Capturing);

    picker.event_sender().cancel();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Cancelled);

    // The camera finishes after the user gave up
    let reply = picker.provider_mut().replies.pop().unwrap();
    reply.fail(BackendError::Busy);
    picker.pump().unwrap();

    assert_eq!(recorder.calls(), vec![Call::Cancelled]);
}

#[test]
fn test_cancel_while_confirming_drops_image() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    picker.capture_button().tap();
    picker.pump().unwrap();

    picker.event_sender().cancel();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Cancelled);
    assert!(picker.pending_image().is_none());
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Cancelled]);
}

#[test]
fn test_only_one_capture_per_outstanding_request() {
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(ParkedProvider::default(), FeatureFlags::default())
        .with_delegate(&recorder);
    picker.activate().unwrap();

    let sender = picker.event_sender();
    sender.trigger();
    sender.trigger();
    picker.pump().unwrap();
    assert_eq!(picker.provider().replies.len(), 1);

    let reply = picker.provider_mut().replies.pop().unwrap();
    reply.succeed(capture_picker::CameraFrame::from_rgba(
        1,
        1,
        vec![0, 0, 0, 255],
        CameraFacing::Back,
    ));
    picker.pump().unwrap();

    assert_eq!(recorder.calls(), vec![Call::Captured(1)]);
}

#[test]
fn test_volume_button_respects_flag() {
    let flags = FeatureFlags {
        volume_button_takes_picture: false,
        ..FeatureFlags::default()
    };
    let (mut picker, recorder) = picker_with(flags);
    let volume = VolumeButton::new();
    picker.attach_volume_button(&volume);

    assert!(volume.press());
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Previewing);
    assert!(recorder.calls().is_empty());

    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    let volume = VolumeButton::new();
    picker.attach_volume_button(&volume);

    volume.press();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Confirming);
    assert_eq!(recorder.calls(), vec![Call::Captured(1)]);
}

#[test]
fn test_toggle_camera_flips_facing() {
    let (mut picker, _recorder) = picker_with(FeatureFlags::default());
    assert_eq!(picker.facing(), CameraFacing::Back);

    picker.event_sender().toggle_camera();
    picker.pump().unwrap();
    assert_eq!(picker.facing(), CameraFacing::Front);
    assert_eq!(picker.provider().current_facing(), Some(CameraFacing::Front));

    picker.capture_button().tap();
    picker.pump().unwrap();
    assert_eq!(
        picker.pending_image().map(|p| p.facing()),
        Some(CameraFacing::Front)
    );

    // Not while reviewing
    picker.event_sender().toggle_camera();
    picker.pump().unwrap();
    assert_eq!(picker.facing(), CameraFacing::Front);
}

#[test]
fn test_toggle_camera_noop_when_disabled() {
    let flags = FeatureFlags {
        front_camera_enabled: false,
        ..FeatureFlags::default()
    };
    let (mut picker, _recorder) = picker_with(flags);

    picker.event_sender().toggle_camera();
    picker.pump().unwrap();
    assert_eq!(picker.facing(), CameraFacing::Back);
}

#[test]
fn test_toggle_camera_noop_without_front_camera() {
    let mut picker = CapturePickerWorkflow::new(ParkedProvider::default(), FeatureFlags::default());
    picker.activate().unwrap();

    picker.event_sender().toggle_camera();
    picker.pump().unwrap();
    assert_eq!(picker.facing(), CameraFacing::Back);
    assert_eq!(picker.state(), PickerState::Previewing);
}

#[test]
fn test_front_request_without_hardware_uses_back() {
    let camera = VirtualCameraProvider::new(VirtualCameraConfig {
        has_front_camera: false,
        capture_latency: Duration::ZERO,
        ..VirtualCameraConfig::default()
    });
    let mut picker = CapturePickerWorkflow::new(camera, FeatureFlags::default())
        .with_initial_facing(CameraFacing::Front);

    picker.activate().unwrap();
    assert_eq!(picker.facing(), CameraFacing::Back);
}

#[test]
fn test_session_start_failure_leaves_picker_inert() {
    let mut camera = instant_camera();
    camera.deny_session_start(true);
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(camera, FeatureFlags::default()).with_delegate(&recorder);

    let err = picker.activate().unwrap_err();
    assert!(matches!(err, PickerError::SessionStart(BackendError::PermissionDenied)));
    assert!(!err.is_recoverable());
    assert!(!picker.is_active());
    assert!(!picker.capture_button().is_enabled());

    picker
        .handle(PickerEvent::TriggerCapture(TriggerSource::CaptureButton))
        .unwrap();
    picker.event_sender().toggle_camera();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Previewing);
    assert_eq!(picker.provider().captures(), 0);
    assert!(recorder.calls().is_empty());

    // Access granted later
    picker.provider_mut().deny_session_start(false);
    picker.activate().unwrap();
    assert!(picker.capture_button().is_enabled());
}

#[test]
fn test_cancel_after_session_start_failure_finishes_picker() {
    let mut camera = instant_camera();
    camera.deny_session_start(true);
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(camera, FeatureFlags::default()).with_delegate(&recorder);
    assert!(picker.activate().is_err());

    let sender = picker.event_sender();
    sender.cancel();
    sender.cancel();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Cancelled);
    assert!(picker.is_finished());
    assert_eq!(recorder.calls(), vec![Call::Cancelled]);

    // Finished pickers stay finished
    picker.provider_mut().deny_session_start(false);
    picker.activate().unwrap();
    assert!(!picker.is_active());
    assert_eq!(picker.state(), PickerState::Cancelled);
}

fn stray_frame() -> CameraFrame {
    CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255], CameraFacing::Back)
}

/// One of each event kind, tagged with `request` where it carries one
fn every_event(request: u64) -> Vec<PickerEvent> {
    vec![
        PickerEvent::TriggerCapture(TriggerSource::CaptureButton),
        PickerEvent::TriggerCapture(TriggerSource::VolumeButton),
        PickerEvent::capture_succeeded(request, stray_frame()),
        PickerEvent::capture_failed(request, BackendError::Busy),
        PickerEvent::Confirm,
        PickerEvent::Retake,
        PickerEvent::Cancel,
        PickerEvent::ToggleCamera,
        PickerEvent::AutoRetake { request },
    ]
}

/// Active picker on a two-camera device, driven into `state`
///
/// `Confirming` holds request 2, taken after retaking request 1.
fn picker_in(state: PickerState) -> (CapturePickerWorkflow<VirtualCameraProvider>, Arc<Recorder>) {
    let camera = match state {
        // Still never arrives while the test runs
        PickerState::Capturing => VirtualCameraProvider::new(VirtualCameraConfig {
            width: 8,
            height: 8,
            has_front_camera: true,
            capture_latency: Duration::from_secs(3600),
            ..VirtualCameraConfig::default()
        }),
        _ => instant_camera(),
    };
    let flags = FeatureFlags {
        volume_button_takes_picture: true,
        front_camera_enabled: true,
        ..FeatureFlags::default()
    };
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(camera, flags).with_delegate(&recorder);
    picker.activate().unwrap();

    let steps = match state {
        PickerState::Previewing => vec![],
        PickerState::Capturing => vec![PickerEvent::TriggerCapture(TriggerSource::CaptureButton)],
        PickerState::Confirming => vec![
            PickerEvent::TriggerCapture(TriggerSource::CaptureButton),
            PickerEvent::Retake,
            PickerEvent::TriggerCapture(TriggerSource::CaptureButton),
        ],
        PickerState::Confirmed => vec![
            PickerEvent::TriggerCapture(TriggerSource::CaptureButton),
            PickerEvent::Confirm,
        ],
        PickerState::Cancelled => vec![PickerEvent::Cancel],
    };
    let sender = picker.event_sender();
    for step in steps {
        sender.send(step);
        picker.pump().unwrap();
    }
    assert_eq!(picker.state(), state);
    (picker, recorder)
}

#[test]
fn test_events_without_transition_change_nothing() {
    use PickerEvent::*;
    use PickerState::*;

    let table: Vec<(PickerState, Vec<PickerEvent>)> = vec![
        (
            Previewing,
            vec![
                Confirm,
                Retake,
                AutoRetake { request: 1 },
                PickerEvent::capture_succeeded(1, stray_frame()),
                PickerEvent::capture_failed(1, BackendError::Busy),
            ],
        ),
        (
            Capturing,
            vec![
                TriggerCapture(TriggerSource::CaptureButton),
                TriggerCapture(TriggerSource::VolumeButton),
                Confirm,
                Retake,
                ToggleCamera,
                AutoRetake { request: 1 },
                PickerEvent::capture_succeeded(2, stray_frame()),
                PickerEvent::capture_failed(7, BackendError::Busy),
            ],
        ),
        (
            Confirming,
            vec![
                TriggerCapture(TriggerSource::CaptureButton),
                TriggerCapture(TriggerSource::VolumeButton),
                ToggleCamera,
                // Auto-retake left over from the discarded first capture
                AutoRetake { request: 1 },
                PickerEvent::capture_succeeded(2, stray_frame()),
                PickerEvent::capture_failed(2, BackendError::Busy),
            ],
        ),
        (Confirmed, every_event(1)),
        (Cancelled, every_event(1)),
    ];

    for (state, events) in table {
        for event in events {
            let (mut picker, recorder) = picker_in(state);
            let calls = recorder.calls();
            let facing = picker.facing();
            let pending = picker.pending_image().map(|p| p.request());
            let captures = picker.provider().captures();
            let label = format!("{:?} in {}", event, state);

            picker.handle(event).unwrap();
            picker.pump().unwrap();

            assert_eq!(picker.state(), state, "{}", label);
            assert_eq!(recorder.calls(), calls, "{}", label);
            assert_eq!(picker.facing(), facing, "{}", label);
            assert_eq!(picker.pending_image().map(|p| p.request()), pending, "{}", label);
            assert_eq!(picker.provider().captures(), captures, "{}", label);
        }
    }
}

#[test]
fn test_capture_failure_returns_to_preview() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    picker.provider_mut().fail_next_captures(1);

    picker.capture_button().tap();
    let err = picker.pump().unwrap_err();
    assert!(matches!(err, PickerError::Capture(BackendError::CaptureFailed(_))));
    assert!(err.is_recoverable());
    assert_eq!(picker.state(), PickerState::Previewing);
    assert!(recorder.calls().is_empty());

    picker.capture_button().tap();
    picker.pump().unwrap();
    assert_eq!(picker.state(), PickerState::Confirming);
    assert_eq!(recorder.calls(), vec![Call::Captured(2)]);
}

#[test]
fn test_dropped_delegate_is_silent() {
    let (mut picker, recorder) = picker_with(FeatureFlags::default());
    drop(recorder);

    picker.capture_button().tap();
    picker.pump().unwrap();
    picker.event_sender().confirm();
    picker.pump().unwrap();

    assert_eq!(picker.state(), PickerState::Confirmed);
}

#[test]
fn test_finished_picker_does_not_reactivate() {
    let (mut picker, _recorder) = picker_with(FeatureFlags::default());
    picker.event_sender().cancel();
    picker.pump().unwrap();

    picker.deactivate();
    picker.activate().unwrap();
    assert!(!picker.is_active());
    assert!(!picker.provider().is_running());
}

#[tokio::test]
async fn test_async_host_loop_with_capture_latency() {
    let camera = VirtualCameraProvider::new(VirtualCameraConfig {
        width: 16,
        height: 16,
        capture_latency: Duration::from_millis(5),
        ..VirtualCameraConfig::default()
    });
    let recorder = Arc::new(Recorder::default());
    let mut picker = CapturePickerWorkflow::new(camera, FeatureFlags::default()).with_delegate(&recorder);
    picker.activate().unwrap();

    picker.capture_button().tap();
    while picker.state() != PickerState::Confirming {
        tokio::time::timeout(Duration::from_secs(5), picker.process_next())
            .await
            .expect("capture completion")
            .unwrap();
    }

    picker.event_sender().confirm();
    picker.process_next().await.unwrap();
    assert_eq!(picker.state(), PickerState::Confirmed);
    assert_eq!(recorder.calls(), vec![Call::Captured(1), Call::Confirmed(1)]);
}
