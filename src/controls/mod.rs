// SPDX-License-Identifier: GPL-3.0-only

//! Controls and action forwarding
//!
//! Anything that can trigger picker input (the on-screen capture button, a
//! hardware volume button, a proxy that re-emits another control's actions)
//! is an [`ActionSource`]. Consumers register handlers; there is no
//! inheritance between controls.

pub mod capture_button;
pub mod forwarding;

pub use capture_button::{ButtonPlacement, CaptureButton, VolumeButton};
pub use forwarding::ForwardingControl;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Handle returned by [`ActionSource::subscribe`]
pub type SubscriptionId = u64;

/// Callback invoked for every action a source emits
pub type ActionHandler = Arc<dyn Fn(ControlEvent) + Send + Sync>;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Touch-style events a control emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    /// Finger (or key) went down on the control
    TouchDown,
    /// Released inside the control; this is the "activate" event
    TouchUpInside,
    /// Interaction abandoned
    TouchCancel,
}

/// Visual state of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub highlighted: bool,
    pub selected: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            enabled: true,
            highlighted: false,
            selected: false,
        }
    }
}

/// A source of control actions
pub trait ActionSource {
    /// Register a handler; it is called for every event until unsubscribed
    fn subscribe(&self, handler: ActionHandler) -> SubscriptionId;

    /// Remove a handler. Returns false if it was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct ControlInner {
    state: ControlState,
    handlers: Vec<(SubscriptionId, ActionHandler)>,
}

/// Basic control with shared state
///
/// Clones refer to the same control, so the host and the workflow can both
/// hold it.
#[derive(Clone)]
pub struct Control {
    inner: Arc<Mutex<ControlInner>>,
}

impl Control {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControlInner {
                state: ControlState::default(),
                handlers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state
    pub fn state(&self) -> ControlState {
        self.lock().state
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().state.enabled
    }

    /// Enable or disable; a disabled control drops events and loses its highlight
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.state.enabled = enabled;
        if !enabled {
            inner.state.highlighted = false;
        }
    }

    pub fn set_highlighted(&self, highlighted: bool) {
        self.lock().state.highlighted = highlighted;
    }

    pub fn set_selected(&self, selected: bool) {
        self.lock().state.selected = selected;
    }

    /// Emit an event to all subscribers
    ///
    /// Returns false if the control is disabled and the event was dropped.
    /// Handlers run outside the internal lock, so they may touch the control.
    pub fn send_action(&self, event: ControlEvent) -> bool {
        let handlers: Vec<ActionHandler> = {
            let mut inner = self.lock();
            if !inner.state.enabled {
                trace!(?event, "Control disabled, dropping event");
                return false;
            }
            inner.state.highlighted = event == ControlEvent::TouchDown;
            inner.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };

        for handler in handlers {
            handler(event);
        }
        true
    }

    /// Press and release: the usual way a tap reaches subscribers
    pub fn tap(&self) -> bool {
        self.send_action(ControlEvent::TouchDown) && self.send_action(ControlEvent::TouchUpInside)
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.lock().handlers.len()
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Control")
            .field("state", &inner.state)
            .field("subscribers", &inner.handlers.len())
            .finish()
    }
}

impl ActionSource for Control {
    fn subscribe(&self, handler: ActionHandler) -> SubscriptionId {
        let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
        self.lock().handlers.push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.handlers.len();
        inner.handlers.retain(|(sub, _)| *sub != id);
        inner.handlers.len() != before
    }
}
