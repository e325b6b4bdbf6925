//! Event types for the wishlist event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Wishlist event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WishlistEvent {
    /// Place saved after basic resolution, details still pending
    PlaceAdded {
        place_id: Uuid,
        place_name: String,
        country_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Background detail enrichment succeeded
    PlaceEnriched {
        place_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Background detail enrichment failed or timed out
    PlaceEnrichmentFailed {
        place_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Place deleted by the user
    PlaceRemoved {
        place_id: Uuid,
        /// True when the deletion emptied and removed its country
        country_removed: bool,
        timestamp: DateTime<Utc>,
    },

    /// Visited flag or tags changed
    PlaceUpdated {
        place_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    CustomTagAdded {
        tag: String,
        timestamp: DateTime<Utc>,
    },

    /// Persisting the wishlist failed; in-memory state is still current
    PersistenceAdvisory {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl WishlistEvent {
    /// Event name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            WishlistEvent::PlaceAdded { .. } => "PlaceAdded",
            WishlistEvent::PlaceEnriched { .. } => "PlaceEnriched",
            WishlistEvent::PlaceEnrichmentFailed { .. } => "PlaceEnrichmentFailed",
            WishlistEvent::PlaceRemoved { .. } => "PlaceRemoved",
            WishlistEvent::PlaceUpdated { .. } => "PlaceUpdated",
            WishlistEvent::CustomTagAdded { .. } => "CustomTagAdded",
            WishlistEvent::PersistenceAdvisory { .. } => "PersistenceAdvisory",
        }
    }
}

/// Broadcast bus distributing [`WishlistEvent`]s to any number of listeners
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WishlistEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// ```
    /// use wishlist_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WishlistEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WishlistEvent,
    ) -> Result<usize, broadcast::error::SendError<WishlistEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WishlistEvent) {
        let _ = self.tx.send(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(WishlistEvent::CustomTagAdded {
            tag: "Beach".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let place_id = Uuid::new_v4();

        bus.emit_lossy(WishlistEvent::PlaceEnriched {
            place_id,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            WishlistEvent::PlaceEnriched { place_id: id, .. } => assert_eq!(id, place_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = WishlistEvent::PersistenceAdvisory {
            message: "disk full".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PersistenceAdvisory");
        assert_eq!(json["message"], "disk full");
        assert_eq!(event.event_type(), "PersistenceAdvisory");
    }
}
