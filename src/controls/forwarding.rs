// SPDX-License-Identifier: GPL-3.0-only

//! State-forwarding proxy control
//!
//! A [`ForwardingControl`] stands in front of a target control: touches on
//! the proxy drive the target, the proxy reports the target's state as its
//! own, and every action the target emits is re-emitted to the proxy's
//! subscribers. Handy when the visible widget and the control that owns the
//! behavior are different objects, e.g. a large invisible hit area over a
//! small capture button.

use super::{ActionHandler, ActionSource, Control, ControlEvent, ControlState, SubscriptionId};
use std::sync::Arc;
use tracing::debug;

pub struct ForwardingControl {
    target: Control,
    relay: Control,
    target_subscription: SubscriptionId,
}

impl ForwardingControl {
    /// Create a proxy for `target`
    pub fn new(target: &Control) -> Self {
        let relay = Control::new();
        let emitter = relay.clone();
        let target_subscription = target.subscribe(Arc::new(move |event| {
            emitter.send_action(event);
        }));

        debug!(target_subscription, "Forwarding control attached");

        Self {
            target: target.clone(),
            relay,
            target_subscription,
        }
    }

    /// The control receiving forwarded touches
    pub fn target(&self) -> &Control {
        &self.target
    }

    /// State of the target, reported as the proxy's own
    pub fn state(&self) -> ControlState {
        self.target.state()
    }

    /// Forward a touch to the target
    ///
    /// Returns false if the target is disabled.
    pub fn send_action(&self, event: ControlEvent) -> bool {
        self.target.send_action(event)
    }

    /// Forward a full tap to the target
    pub fn tap(&self) -> bool {
        self.target.tap()
    }

    pub fn set_highlighted(&self, highlighted: bool) {
        self.target.set_highlighted(highlighted);
    }

    pub fn set_selected(&self, selected: bool) {
        self.target.set_selected(selected);
    }
}

impl ActionSource for ForwardingControl {
    fn subscribe(&self, handler: ActionHandler) -> SubscriptionId {
        self.relay.subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.relay.unsubscribe(id)
    }
}

impl Drop for ForwardingControl {
    fn drop(&mut self) {
        self.target.unsubscribe(self.target_subscription);
    }
}
