// SPDX-License-Identifier: GPL-3.0-only

//! Capture Picker - a single-photo camera picker
//!
//! Presents a live preview, takes exactly one still, optionally lets the
//! user accept or retake it, and reports the outcome to a delegate.
//!
//! # Architecture
//!
//! - [`picker`]: the capture workflow state machine and its delegate
//! - [`backends`]: camera session providers
//! - [`controls`]: capture button, volume button and action forwarding
//! - [`layout`]: edge constraints for overlay views
//! - [`preview`]: preview surface seam
//! - [`config`]: feature flags and user configuration
//! - [`terminal`]: interactive terminal front-end
//!
//! # Example
//!
//! ```ignore
//! let provider = VirtualCameraProvider::default();
//! let mut picker = CapturePickerWorkflow::new(provider, FeatureFlags::default())
//!     .with_delegate(&delegate);
//! picker.activate()?;
//! picker.capture_button().tap();
//! picker.process_next().await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod controls;
pub mod drawing;
pub mod errors;
pub mod layout;
pub mod picker;
pub mod preview;
pub mod terminal;

// Re-export commonly used types
pub use backends::camera::{BackendError, CameraFacing, CameraFrame, CaptureSessionProvider};
pub use backends::virtual_camera::{VirtualCameraConfig, VirtualCameraProvider};
pub use config::{Config, FeatureFlags};
pub use errors::{AppError, AppResult, PickerError, PickerResult};
pub use picker::{
    CaptureResult, CapturePickerWorkflow, PickerDelegate, PickerEvent, PickerId, PickerState,
};
