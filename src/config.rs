// SPDX-License-Identifier: GPL-3.0-only

//! Picker configuration
//!
//! [`FeatureFlags`] are what the workflow reads. [`Config`] wraps them with
//! front-end settings and is persisted as JSON under the user config
//! directory.

use crate::backends::camera::CameraFacing;
use crate::constants::{self, defaults, virtual_camera};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What auto-retake does once a capture lands in `Confirming`
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoRetakePolicy {
    /// Drop the image and go straight back to the live preview
    #[default]
    DiscardAndReloopImmediately,
}

impl AutoRetakePolicy {
    pub fn display_name(&self) -> &'static str {
        match self {
            AutoRetakePolicy::DiscardAndReloopImmediately => "discard-and-reloop-immediately",
        }
    }
}

/// Picker behavior switches
///
/// Set once before the workflow is built; the workflow only reads them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Show the confirmation step after a capture
    pub editing_enabled: bool,
    /// Hardware volume button triggers a capture
    pub volume_button_takes_picture: bool,
    /// Allow switching to the front camera
    pub front_camera_enabled: bool,
    /// Discard each capture and return to preview right away
    pub auto_retake_enabled: bool,
    /// How auto-retake behaves when enabled
    pub auto_retake_policy: AutoRetakePolicy,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            editing_enabled: defaults::EDITING_ENABLED,
            volume_button_takes_picture: defaults::VOLUME_BUTTON_TAKES_PICTURE,
            front_camera_enabled: defaults::FRONT_CAMERA_ENABLED,
            auto_retake_enabled: defaults::AUTO_RETAKE_ENABLED,
            auto_retake_policy: AutoRetakePolicy::default(),
        }
    }
}

impl FeatureFlags {
    /// Auto-retake only has something to discard when editing is on
    pub fn auto_retake_active(&self) -> bool {
        self.auto_retake_enabled && self.editing_enabled
    }
}

/// Persisted settings
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workflow feature flags
    pub flags: FeatureFlags,
    /// Camera to open first
    pub initial_facing: CameraFacing,
    /// Synthetic camera resolution (width, height)
    pub resolution: (u32, u32),
    /// Synthetic camera preview rate
    pub preview_fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flags: FeatureFlags::default(),
            initial_facing: CameraFacing::Back,
            resolution: (virtual_camera::DEFAULT_WIDTH, virtual_camera::DEFAULT_HEIGHT),
            preview_fps: virtual_camera::DEFAULT_PREVIEW_FPS,
        }
    }
}

impl Config {
    /// Default config file location (`<config dir>/capture-picker/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::APP_ID).join(constants::CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config.sanitized())
    }

    /// Write to the default location
    pub fn save(&self) -> AppResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("No config directory available".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path` as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Clamp values a hand-edited file may get wrong
    fn sanitized(mut self) -> Self {
        let (w, h) = self.resolution;
        if w == 0 || h == 0 {
            self.resolution = (virtual_camera::DEFAULT_WIDTH, virtual_camera::DEFAULT_HEIGHT);
        }
        self.preview_fps = self.preview_fps.clamp(1, 60);
        self
    }
}
