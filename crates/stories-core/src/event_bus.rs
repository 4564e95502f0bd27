//! Typed change feed for storage consumers on other threads or tasks.
//!
//! Every storage notification is also broadcast as a [`StorageEvent`] so
//! async consumers (a websocket bridge, a sync task) can follow changes
//! without registering a synchronous [`Subscriber`](crate::publisher::Subscriber).
//!
//! # Example
//!
//! ```rust
//! use stories_core::event_bus::{EventBus, StorageEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(StorageEvent::Cleared);
//!
//! // In async context:
//! // let event = rx.recv().await.unwrap();
//! # let _ = rx.try_recv();
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default channel capacity for the event bus.
/// Events beyond this capacity will cause slow subscribers to miss events (lag).
const DEFAULT_CAPACITY: usize = 256;

/// What changed in the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StorageEvent {
    /// New records were written.
    Added { count: usize },
    /// The whole collection was cleared and refilled.
    Replaced { count: usize },
    /// Existing records were updated in place, new ones added.
    Updated { updated: usize, added: usize },
    /// Records were removed on request.
    Deleted { count: usize },
    /// Expired records were purged.
    Expired { count: usize },
    /// Everything was removed.
    Cleared,
    #[serde(rename_all = "camelCase")]
    SeenStateChanged { story_id: String, is_seen: bool },
    /// Nothing changed; consumers should re-read (configuration reload).
    Reloaded,
}

/// Broadcasts [`StorageEvent`]s to any number of receivers.
///
/// Uses a tokio broadcast channel internally; sending never blocks and
/// works without a runtime.
pub struct EventBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl EventBus {
    /// Create a new EventBus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new EventBus with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all receivers.
    ///
    /// Returns the number of receivers that got it (0 when nobody listens).
    pub fn emit(&self, event: StorageEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Receive all future events. Past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod storage_event {
        use super::*;

        #[test]
        fn serializes_with_kind_tag() {
            let json = serde_json::to_value(StorageEvent::Added { count: 2 }).unwrap();
            assert_eq!(json["kind"], "added");
            assert_eq!(json["count"], 2);
        }

        #[test]
        fn seen_state_uses_camel_case_fields() {
            let event = StorageEvent::SeenStateChanged {
                story_id: "s1".to_string(),
                is_seen: true,
            };
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["kind"], "seenStateChanged");
            assert_eq!(json["storyId"], "s1");
            assert_eq!(json["isSeen"], true);

            let parsed: StorageEvent = serde_json::from_value(json).unwrap();
            assert_eq!(parsed, event);
        }
    }

    mod event_bus {
        use super::*;

        #[test]
        fn new_creates_bus() {
            let bus = EventBus::new();
            assert_eq!(bus.subscriber_count(), 0);
        }

        #[test]
        fn subscribe_increments_count() {
            let bus = EventBus::default();
            let _rx1 = bus.subscribe();
            let _rx2 = bus.subscribe();
            assert_eq!(bus.subscriber_count(), 2);
        }

        #[test]
        fn dropped_subscriber_decrements_count() {
            let bus = EventBus::new();
            let rx = bus.subscribe();
            drop(rx);
            assert_eq!(bus.subscriber_count(), 0);
        }

        #[test]
        fn emit_returns_zero_with_no_subscribers() {
            let bus = EventBus::new();
            assert_eq!(bus.emit(StorageEvent::Cleared), 0);
        }

        #[tokio::test]
        async fn emit_reaches_every_subscriber() {
            let bus = EventBus::new();
            let mut rx1 = bus.subscribe();
            let mut rx2 = bus.subscribe();

            assert_eq!(bus.emit(StorageEvent::Deleted { count: 1 }), 2);

            assert_eq!(rx1.recv().await.unwrap(), StorageEvent::Deleted { count: 1 });
            assert_eq!(rx2.recv().await.unwrap(), StorageEvent::Deleted { count: 1 });
        }

        #[tokio::test]
        async fn late_subscriber_misses_old_events() {
            let bus = EventBus::new();
            let mut early = bus.subscribe();

            bus.emit(StorageEvent::Cleared);
            let mut late = bus.subscribe();
            bus.emit(StorageEvent::Reloaded);

            assert_eq!(early.recv().await.unwrap(), StorageEvent::Cleared);
            assert_eq!(early.recv().await.unwrap(), StorageEvent::Reloaded);
            assert_eq!(late.recv().await.unwrap(), StorageEvent::Reloaded);
        }

        #[tokio::test]
        async fn slow_subscriber_lags() {
            let bus = EventBus::with_capacity(2);
            let mut rx = bus.subscribe();

            for count in 0..4 {
                bus.emit(StorageEvent::Added { count });
            }

            let result = rx.recv().await;
            assert!(matches!(
                result,
                Err(broadcast::error::RecvError::Lagged(_))
            ));
        }
    }
}
