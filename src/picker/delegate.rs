// SPDX-License-Identifier: GPL-3.0-only

//! Delegate protocol
//!
//! The host learns about user-driven outcomes through a [`PickerDelegate`].
//! The workflow keeps only a weak reference: it never keeps the host alive,
//! and a missing or dropped delegate turns every callback into a no-op.

use super::{CaptureResult, PickerId};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Host callbacks. Every method is optional.
pub trait PickerDelegate: Send + Sync {
    /// A still was captured, before any confirmation
    fn did_capture_image(&self, picker: PickerId, picture: &CaptureResult) {
        let _ = (picker, picture);
    }

    /// The image was accepted; ownership moves to the host
    fn did_confirm_image(&self, picker: PickerId, picture: CaptureResult) {
        let _ = (picker, picture);
    }

    /// The user cancelled
    fn picker_did_cancel(&self, picker: PickerId) {
        let _ = picker;
    }
}

/// Non-owning delegate reference
#[derive(Clone, Default)]
pub struct DelegateHandle {
    delegate: Option<Weak<dyn PickerDelegate>>,
}

impl DelegateHandle {
    /// No delegate
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<D: PickerDelegate + 'static>(delegate: &Arc<D>) -> Self {
        let weak = Arc::downgrade(delegate);
        let weak: Weak<dyn PickerDelegate> = weak;
        Self {
            delegate: Some(weak),
        }
    }

    pub fn from_weak(delegate: Weak<dyn PickerDelegate>) -> Self {
        Self {
            delegate: Some(delegate),
        }
    }

    /// Whether a live delegate is attached
    pub fn is_attached(&self) -> bool {
        self.upgrade().is_some()
    }

    fn upgrade(&self) -> Option<Arc<dyn PickerDelegate>> {
        let delegate = self.delegate.as_ref()?.upgrade();
        if delegate.is_none() {
            trace!("Delegate absent, skipping callback");
        }
        delegate
    }

    pub(crate) fn did_capture_image(&self, picker: PickerId, picture: &CaptureResult) {
        if let Some(delegate) = self.upgrade() {
            delegate.did_capture_image(picker, picture);
        }
    }

    pub(crate) fn did_confirm_image(&self, picker: PickerId, picture: CaptureResult) {
        if let Some(delegate) = self.upgrade() {
            delegate.did_confirm_image(picker, picture);
        }
    }

    pub(crate) fn picker_did_cancel(&self, picker: PickerId) {
        if let Some(delegate) = self.upgrade() {
            delegate.picker_did_cancel(picker);
        }
    }
}

impl std::fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}
