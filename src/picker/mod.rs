// SPDX-License-Identifier: GPL-3.0-only

//! Still-photo capture picker
//!
//! [`CapturePickerWorkflow`] owns the picker state and mediates between a
//! [`CaptureSessionProvider`](crate::backends::camera::CaptureSessionProvider),
//! the trigger controls and a [`PickerDelegate`].

pub mod delegate;
pub mod result;
pub mod state;
pub mod workflow;

pub use delegate::{DelegateHandle, PickerDelegate};
pub use result::{CaptureMetadata, CaptureResult};
pub use state::{PickerEvent, PickerEventSender, PickerState, TriggerSource};
pub use workflow::CapturePickerWorkflow;

use serde::Serialize;
use uuid::Uuid;

/// Identifies one picker instance in delegate callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PickerId(Uuid);

impl PickerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PickerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PickerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
