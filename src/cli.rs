// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the capture picker
//!
//! This module provides command-line functionality for:
//! - Headless single captures on the synthetic camera
//! - Showing and resetting the configuration

use capture_picker::backends::camera::CameraFacing;
use capture_picker::backends::virtual_camera::{VirtualCameraConfig, VirtualCameraProvider};
use capture_picker::picker::{
    CaptureMetadata, CapturePickerWorkflow, CaptureResult, PickerDelegate, PickerId, PickerState,
};
use capture_picker::{Config, PickerError, PickerResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Options for the `shoot` command
#[derive(Debug, Clone, Copy)]
pub struct ShootOptions {
    pub timeout: Duration,
    pub no_editing: bool,
    pub front: bool,
    pub fail_captures: u32,
}

impl ShootOptions {
    /// Apply the command line overrides to a loaded config
    ///
    /// A headless run keeps its first good capture, so auto-retake is off.
    pub fn apply(&self, config: &mut Config) {
        if self.no_editing {
            config.flags.editing_enabled = false;
        }
        if self.front {
            config.initial_facing = CameraFacing::Front;
        }
        if config.flags.auto_retake_enabled {
            info!("Auto-retake ignored for a single shot");
            config.flags.auto_retake_enabled = false;
        }
    }
}

/// Collects the single outcome of a headless run
#[derive(Default)]
struct ShootDelegate {
    confirmed: Mutex<Option<CaptureMetadata>>,
    cancelled: AtomicBool,
}

impl PickerDelegate for ShootDelegate {
    fn did_capture_image(&self, _picker: PickerId, picture: &CaptureResult) {
        let (width, height) = picture.dimensions();
        println!("Captured {}x{} from the {} camera", width, height, picture.facing());
    }

    fn did_confirm_image(&self, _picker: PickerId, picture: CaptureResult) {
        *self.confirmed.lock().unwrap_or_else(PoisonError::into_inner) = Some(picture.metadata());
    }

    fn picker_did_cancel(&self, _picker: PickerId) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Take one picture on the synthetic camera and print its metadata
pub fn shoot(options: ShootOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    options.apply(&mut config);

    let mut camera = VirtualCameraProvider::new(VirtualCameraConfig::from_config(&config));
    camera.fail_next_captures(options.fail_captures);

    let delegate = Arc::new(ShootDelegate::default());
    let mut picker = CapturePickerWorkflow::new(camera, config.flags)
        .with_initial_facing(config.initial_facing)
        .with_delegate(&delegate);

    // Set up Ctrl+C handler
    let sender = picker.event_sender();
    ctrlc::set_handler(move || {
        sender.cancel();
    })?;

    picker.activate()?;
    println!("Using {} camera", picker.facing());
    println!("Capturing... (press Ctrl+C to cancel)");
    picker.capture_button().tap();

    let rt = tokio::runtime::Runtime::new()?;
    let finished = rt.block_on(async {
        tokio::time::timeout(options.timeout, drive_to_outcome(&mut picker)).await
    });

    match finished {
        Ok(result) => result?,
        Err(_) => {
            warn!(timeout = ?options.timeout, "Capture timed out, cancelling");
            picker.event_sender().cancel();
            picker.pump()?;
            return Err(format!("No picture within {}s", options.timeout.as_secs()).into());
        }
    }

    if let Some(metadata) = delegate
        .confirmed
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
    {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else if delegate.cancelled.load(Ordering::SeqCst) {
        println!("Cancelled");
    }

    Ok(())
}

/// Apply events until the picker finishes, accepting the first capture
///
/// Failed captures are retried by tapping the button again.
async fn drive_to_outcome(picker: &mut CapturePickerWorkflow<VirtualCameraProvider>) -> PickerResult<()> {
    while !picker.is_finished() {
        match picker.process_next().await {
            Ok(()) => {}
            Err(PickerError::Capture(e)) => {
                println!("Capture failed: {}, retrying", e);
                picker.capture_button().tap();
            }
            Err(e) => return Err(e),
        }

        if picker.state() == PickerState::Confirming {
            info!("Accepting capture");
            picker.event_sender().confirm();
        }
    }
    Ok(())
}

/// Print the effective configuration, optionally resetting it first
pub fn show_config(reset: bool) -> Result<(), Box<dyn std::error::Error>> {
    if reset {
        let path = Config::default().save()?;
        println!("Configuration reset: {}", path.display());
    }

    let config = Config::load()?;
    if let Some(path) = Config::default_path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);

    let camera = VirtualCameraProvider::new(VirtualCameraConfig::from_config(&config));
    println!("Cameras:");
    for device in camera.devices() {
        let (width, height) = device.resolution;
        println!("  {} ({}, {}x{})", device.name, device.facing, width, height);
    }
    Ok(())
}
