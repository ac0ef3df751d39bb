// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus (§4.2): in-process fan-out of lifecycle events to local
//! subscribers, WebSocket clients, and the Webhook Manager.
//!
//! Each subscription owns an unbounded `tokio::sync::mpsc` channel; `emit`
//! only ever does a non-blocking `send` into each matching channel, so a
//! slow subscriber never stalls the emitter and a subscriber's handler may
//! itself call `emit` again without deadlocking (its task is not the
//! emitter's task).

use ob_core::Event;
use parking_lot::Mutex;
use tokio::sync::mpsc;

struct Subscription {
    pattern: String,
    sender: mpsc::UnboundedSender<Event>,
}

/// In-process pub/sub over `Event`, matched by `Event::matches` (exact name
/// or the `"*"` wildcard).
#[derive(Default)]
pub struct EventBus {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events matching `pattern` ("*" or an exact event name).
    /// Returns a receiver the caller drains on its own task; dropping the
    /// receiver unsubscribes (pruned lazily on the next `emit`).
    pub fn subscribe(&self, pattern: impl Into<String>) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.lock().push(Subscription { pattern: pattern.into(), sender: tx });
        rx
    }

    /// Fan out `event` to every matching, still-live subscription. Returns
    /// once all sends have been scheduled; it never awaits a handler.
    pub fn emit(&self, event: Event) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|sub| {
            if !event.matches(&sub.pattern) {
                return true;
            }
            sub.sender.send(event.clone()).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
