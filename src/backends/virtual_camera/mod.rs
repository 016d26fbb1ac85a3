// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera session provider
//!
//! Produces a moving test pattern instead of talking to hardware. Used by the
//! command-line front-ends and by tests that need a provider with real
//! threads behind it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   frames (bounded, drops when full)
//! │ preview thread   │ ─────────────────────────────────▶ FrameReceiver
//! └──────────────────┘
//! ┌──────────────────┐   CaptureReply::succeed / fail
//! │ capture thread   │ ─────────────────────────────────▶ picker event queue
//! └──────────────────┘
//! ```
//!
//! Failure injection covers the error paths a real camera has: a session
//! that refuses to start, and stills that fail.

mod pattern;

pub use pattern::{render_preview, render_still};

use crate::backends::camera::{
    BackendError, BackendResult, CameraDevice, CameraFacing, CaptureReply,
    CaptureSessionProvider, FrameReceiver, FrameSender,
};
use crate::config::Config;
use crate::constants::virtual_camera as defaults;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Synthetic camera settings
#[derive(Debug, Clone)]
pub struct VirtualCameraConfig {
    pub width: u32,
    pub height: u32,
    pub preview_fps: u32,
    /// Whether a front camera "exists"
    pub has_front_camera: bool,
    /// Simulated still readout time; zero completes captures inline
    pub capture_latency: Duration,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            width: defaults::DEFAULT_WIDTH,
            height: defaults::DEFAULT_HEIGHT,
            preview_fps: defaults::DEFAULT_PREVIEW_FPS,
            has_front_camera: true,
            capture_latency: defaults::STILL_CAPTURE_LATENCY,
        }
    }
}

impl VirtualCameraConfig {
    /// Synthetic camera matching the user's configured resolution and rate
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.resolution.0,
            height: config.resolution.1,
            preview_fps: config.preview_fps,
            ..Self::default()
        }
    }
}

/// Running preview thread
struct PreviewWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Camera provider backed by generated frames
pub struct VirtualCameraProvider {
    config: VirtualCameraConfig,
    worker: Option<PreviewWorker>,
    /// Shared with the preview thread so a flip needs no restart
    facing: Arc<Mutex<CameraFacing>>,
    preview_receiver: Option<FrameReceiver>,
    deny_session_start: bool,
    failures_remaining: u32,
    captures: u64,
}

impl VirtualCameraProvider {
    pub fn new(config: VirtualCameraConfig) -> Self {
        Self {
            config,
            worker: None,
            facing: Arc::new(Mutex::new(CameraFacing::Back)),
            preview_receiver: None,
            deny_session_start: false,
            failures_remaining: 0,
            captures: 0,
        }
    }

    /// Make every session start fail as if camera access was refused
    pub fn deny_session_start(&mut self, deny: bool) {
        self.deny_session_start = deny;
    }

    /// Fail the next `count` still captures
    pub fn fail_next_captures(&mut self, count: u32) {
        self.failures_remaining = count;
    }

    pub fn config(&self) -> &VirtualCameraConfig {
        &self.config
    }

    /// Number of stills delivered so far
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Cameras this provider pretends to have
    pub fn devices(&self) -> Vec<CameraDevice> {
        let resolution = (self.config.width, self.config.height);
        let mut devices = vec![CameraDevice {
            name: "Virtual Back Camera".to_string(),
            facing: CameraFacing::Back,
            resolution,
        }];
        if self.config.has_front_camera {
            devices.push(CameraDevice {
                name: "Virtual Front Camera".to_string(),
                facing: CameraFacing::Front,
                resolution,
            });
        }
        devices
    }

    fn current(&self) -> CameraFacing {
        *self.facing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_current(&self, facing: CameraFacing) {
        *self.facing.lock().unwrap_or_else(PoisonError::into_inner) = facing;
    }

    fn spawn_preview(&self, sender: FrameSender) -> BackendResult<PreviewWorker> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let facing = Arc::clone(&self.facing);
        let (width, height) = (self.config.width, self.config.height);
        let interval = Duration::from_secs(1) / self.config.preview_fps.max(1);

        let handle = std::thread::Builder::new()
            .name("virtual-camera-preview".into())
            .spawn(move || preview_loop(sender, thread_stop, facing, width, height, interval))
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(PreviewWorker { stop, handle })
    }
}

fn preview_loop(
    mut sender: FrameSender,
    stop: Arc<AtomicBool>,
    facing: Arc<Mutex<CameraFacing>>,
    width: u32,
    height: u32,
    interval: Duration,
) {
    debug!(width, height, ?interval, "Preview thread started");
    let mut tick = 0u64;
    while !stop.load(Ordering::Acquire) {
        let current = *facing.lock().unwrap_or_else(PoisonError::into_inner);
        let frame = render_preview(width, height, current, tick);
        if let Err(e) = sender.try_send(frame) {
            if e.is_disconnected() {
                debug!("Preview receiver dropped, stopping preview thread");
                break;
            }
            // Consumer is behind; drop this frame
        }
        tick = tick.wrapping_add(1);
        std::thread::sleep(interval);
    }
    debug!(frames = tick, "Preview thread stopped");
}

impl Default for VirtualCameraProvider {
    fn default() -> Self {
        Self::new(VirtualCameraConfig::default())
    }
}

impl CaptureSessionProvider for VirtualCameraProvider {
    fn start_preview(&mut self, facing: CameraFacing) -> BackendResult<()> {
        if self.deny_session_start {
            warn!("Virtual camera access denied (injected)");
            return Err(BackendError::PermissionDenied);
        }
        if !self.has_camera(facing) {
            return Err(BackendError::DeviceNotFound(format!("{} camera", facing)));
        }

        if self.worker.is_some() {
            if self.current() != facing {
                self.switch_facing(facing)?;
            }
            return Ok(());
        }

        info!(
            width = self.config.width,
            height = self.config.height,
            fps = self.config.preview_fps,
            %facing,
            "Starting virtual camera preview"
        );

        self.set_current(facing);
        let (sender, receiver) = futures::channel::mpsc::channel(defaults::PREVIEW_CHANNEL_CAPACITY);
        self.worker = Some(self.spawn_preview(sender)?);
        self.preview_receiver = Some(receiver);
        Ok(())
    }

    fn stop_preview(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        info!("Stopping virtual camera preview");
        worker.stop.store(true, Ordering::Release);
        if worker.handle.join().is_err() {
            error!("Virtual camera preview thread panicked");
        }
        self.preview_receiver = None;
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn capture_still(&mut self, reply: CaptureReply) {
        if self.worker.is_none() {
            reply.fail(BackendError::NotRunning);
            return;
        }

        let request = reply.request();
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            warn!(request, remaining = self.failures_remaining, "Failing still capture (injected)");
            reply.fail(BackendError::CaptureFailed("sensor readout error".into()));
            return;
        }

        self.captures += 1;
        let sequence = self.captures;
        let facing = reply.facing();
        let (width, height) = (self.config.width, self.config.height);
        let latency = self.config.capture_latency;

        debug!(request, sequence, %facing, "Virtual still capture");

        if latency.is_zero() {
            reply.succeed(render_still(width, height, facing, sequence));
            return;
        }

        let slot = Arc::new(Mutex::new(Some(reply)));
        let thread_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name("virtual-camera-still".into())
            .spawn(move || {
                std::thread::sleep(latency);
                let reply = thread_slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(reply) = reply {
                    reply.succeed(render_still(width, height, facing, sequence));
                }
            });
        if let Err(e) = spawned {
            error!(request, error = %e, "Could not spawn still capture thread");
            let reply = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(reply) = reply {
                reply.fail(BackendError::CaptureFailed(e.to_string()));
            }
        }
    }

    fn has_camera(&self, facing: CameraFacing) -> bool {
        match facing {
            CameraFacing::Back => true,
            CameraFacing::Front => self.config.has_front_camera,
        }
    }

    fn switch_facing(&mut self, facing: CameraFacing) -> BackendResult<()> {
        if !self.has_camera(facing) {
            return Err(BackendError::DeviceNotFound(format!("{} camera", facing)));
        }
        if self.worker.is_none() {
            return Err(BackendError::NotRunning);
        }
        self.set_current(facing);
        info!(%facing, "Virtual camera switched");
        Ok(())
    }

    fn current_facing(&self) -> Option<CameraFacing> {
        self.worker.as_ref().map(|_| self.current())
    }

    fn preview_receiver(&mut self) -> Option<FrameReceiver> {
        self.preview_receiver.take()
    }
}

impl Drop for VirtualCameraProvider {
    fn drop(&mut self) {
        self.stop_preview();
    }
}
