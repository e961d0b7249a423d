//! In-process event bus. Workers, the Automation Engine, and the Watcher
//! all publish `Event`s here; the Automation Engine is the primary
//! subscriber, driving `HandleEvent` from the stream.

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::models::Event;

const CHANNEL_CAPACITY: usize = 1024;

/// Thin wrapper over a broadcast channel. Cloning shares the same bus.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publishes an event. Errors only when there are zero subscribers,
    /// which is not a failure for a fire-and-forget bus.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event.clone()).is_err() {
            trace!(event_type = %event.event_type, "published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
