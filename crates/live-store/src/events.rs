//! Explicit publish/subscribe channel for store lifecycle events.
//!
//! Hosts construct one [`EventBus`] and hand clones to the stores that should
//! publish on it. There is no process-wide instance.

use std::time::Duration;

use tokio::sync::broadcast;

/// Something that happened to a live store.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEventKind {
    Started,
    /// A cycle completed. `changed` is false when every sub-resource
    /// answered 304.
    Updated { changed: bool },
    /// A cycle failed; `backoff` is the accumulated failure delay.
    Failed { message: String, backoff: Duration },
    Hidden,
    Woken,
    Destroyed,
}

/// Envelope carrying the store name alongside the event.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreEvent {
    pub store: &'static str,
    pub kind: StoreEventKind,
}

impl StoreEvent {
    pub fn new(store: &'static str, kind: StoreEventKind) -> Self {
        Self { store, kind }
    }
}

/// Lightweight broadcast bus that fans store events out to listeners.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StoreEvent) {
        // Lagging or absent listeners are ignored to avoid blocking stores.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(StoreEvent::new("horses", StoreEventKind::Started));

        assert_eq!(first.recv().await.unwrap().kind, StoreEventKind::Started);
        assert_eq!(second.recv().await.unwrap().store, "horses");
    }

    #[test]
    fn test_publish_without_listeners_is_ignored() {
        let bus = EventBus::default();
        bus.publish(StoreEvent::new("stable", StoreEventKind::Destroyed));
    }
}
