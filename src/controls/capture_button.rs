// SPDX-License-Identifier: GPL-3.0-only

//! Capture trigger controls

use super::{ActionHandler, ActionSource, Control, SubscriptionId};
use crate::constants::ui;
use crate::drawing::{fill_circle, image_with_size};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Where the host wants the capture button drawn
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ButtonPlacement {
    /// Centered in the bottom bar
    #[default]
    BottomCenter,
    /// Right end of the bottom bar
    BottomTrailing,
    /// Explicit position in surface coordinates
    Custom { x: f32, y: f32 },
}

/// The picker's on-screen capture button
///
/// Activating it (a tap) is the same as a `TriggerCapture` event. The
/// workflow disables it whenever a capture cannot start.
#[derive(Debug, Clone)]
pub struct CaptureButton {
    control: Control,
    label: String,
    placement: ButtonPlacement,
}

impl CaptureButton {
    pub fn new() -> Self {
        Self {
            control: Control::new(),
            label: ui::CAPTURE_BUTTON_LABEL.to_string(),
            placement: ButtonPlacement::default(),
        }
    }

    /// Underlying control
    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn placement(&self) -> ButtonPlacement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: ButtonPlacement) {
        self.placement = placement;
    }

    /// Tap the button
    pub fn tap(&self) -> bool {
        self.control.tap()
    }

    pub fn is_enabled(&self) -> bool {
        self.control.is_enabled()
    }

    /// Render the button glyph at `size` pixels
    ///
    /// White disc inside a ring; grayed out while disabled, slightly smaller
    /// while pressed.
    pub fn icon(&self, size: u32) -> RgbaImage {
        let state = self.control.state();
        let color = if !state.enabled {
            Rgba([128, 128, 128, 80])
        } else if state.highlighted {
            Rgba([180, 180, 180, 255])
        } else {
            Rgba([255, 255, 255, 255])
        };

        image_with_size(size, size, |canvas, dims| {
            let center = dims.center();
            let outer = size / 2;
            fill_circle(canvas, center, outer, color);
            // Transparent gap between ring and disc
            fill_circle(canvas, center, outer.saturating_sub(outer / 6), Rgba([0, 0, 0, 0]));

            let scale = if state.highlighted {
                ui::CAPTURE_BUTTON_PRESSED_SCALE
            } else {
                1.0
            };
            let inner = ((outer.saturating_sub(outer / 4)) as f32 * scale) as u32;
            fill_circle(canvas, center, inner, color);
        })
    }
}

impl Default for CaptureButton {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionSource for CaptureButton {
    fn subscribe(&self, handler: ActionHandler) -> SubscriptionId {
        self.control.subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.control.unsubscribe(id)
    }
}

/// Hardware volume button as an action source
///
/// Platform glue calls [`press`](Self::press) when the key is seen; the
/// picker decides whether it takes a picture.
#[derive(Debug, Clone, Default)]
pub struct VolumeButton {
    control: Control,
}

impl VolumeButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a press
    pub fn press(&self) -> bool {
        self.control.tap()
    }
}

impl ActionSource for VolumeButton {
    fn subscribe(&self, handler: ActionHandler) -> SubscriptionId {
        self.control.subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.control.unsubscribe(id)
    }
}
