// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier, used for the config directory
pub const APP_ID: &str = "capture-picker";

/// Config file name inside the app config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Feature flag defaults
pub mod defaults {
    /// Confirmation screen shown after capture
    pub const EDITING_ENABLED: bool = true;
    /// Hardware volume button triggers capture
    pub const VOLUME_BUTTON_TAKES_PICTURE: bool = true;
    /// Camera facing toggle allowed
    pub const FRONT_CAMERA_ENABLED: bool = true;
    /// Discard each capture and loop back to preview
    pub const AUTO_RETAKE_ENABLED: bool = false;
}

/// Synthetic camera settings
pub mod virtual_camera {
    use std::time::Duration;

    /// Default still resolution
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Default preview frame rate
    pub const DEFAULT_PREVIEW_FPS: u32 = 15;

    /// Simulated sensor readout time for a still
    pub const STILL_CAPTURE_LATENCY: Duration = Duration::from_millis(120);

    /// Preview channel depth; extra frames are dropped
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 4;
}

/// Terminal front-end settings
pub mod ui {
    use std::time::Duration;

    /// Default capture button label
    pub const CAPTURE_BUTTON_LABEL: &str = "Capture";

    /// Icon scale while the button is held down
    pub const CAPTURE_BUTTON_PRESSED_SCALE: f32 = 0.85;

    /// How long the terminal loop waits for a key per tick
    pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(33);

    /// Height of the bottom control bar in rows
    pub const CONTROL_BAR_HEIGHT: u16 = 3;
}

/// Default watchdog for the headless `shoot` command
pub const DEFAULT_SHOOT_TIMEOUT: Duration = Duration::from_secs(10);
