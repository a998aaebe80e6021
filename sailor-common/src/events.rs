//! Domain events and the broadcast bus that carries them
//!
//! Events are published by the API handlers after a write commits and
//! streamed to dashboards over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Sailor Skills event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SailorEvent {
    /// Booking created through the calendar flow
    BookingCreated {
        booking_id: String,
        service_type: String,
        scheduled_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Admin changed a booking (status, reschedule, notes)
    BookingUpdated {
        booking_id: String,
        status: String,
        timestamp: DateTime<Utc>,
    },

    QuoteSaved {
        quote_number: String,
        total: f64,
        timestamp: DateTime<Utc>,
    },

    /// On-hand quantity moved
    StockChanged {
        item_type: String,
        item_id: String,
        quantity_change: i64,
        on_hand: i64,
        timestamp: DateTime<Utc>,
    },

    ReplenishmentQueued {
        item_type: String,
        item_id: String,
        quantity: i64,
        priority: String,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// Customer card charged for completed service
    PaymentCaptured {
        order_id: String,
        payment_intent_id: String,
        amount_cents: i64,
        timestamp: DateTime<Utc>,
    },

    /// Saved card charged directly from the admin billing page
    CustomerCharged {
        customer_id: String,
        payment_intent_id: String,
        amount_cents: i64,
        /// "service" or "anode_replacement"
        purpose: String,
        timestamp: DateTime<Utc>,
    },
}

impl SailorEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            SailorEvent::BookingCreated { .. } => "BookingCreated",
            SailorEvent::BookingUpdated { .. } => "BookingUpdated",
            SailorEvent::QuoteSaved { .. } => "QuoteSaved",
            SailorEvent::StockChanged { .. } => "StockChanged",
            SailorEvent::ReplenishmentQueued { .. } => "ReplenishmentQueued",
            SailorEvent::PaymentCaptured { .. } => "PaymentCaptured",
            SailorEvent::CustomerCharged { .. } => "CustomerCharged",
        }
    }
}

/// Broadcast bus shared by all handlers
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SailorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus; `capacity` events are buffered per receiver
    /// before the oldest are dropped
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SailorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SailorEvent,
    ) -> Result<usize, broadcast::error::SendError<SailorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SailorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_saved() -> SailorEvent {
        SailorEvent::QuoteSaved {
            quote_number: "Q-1001".to_string(),
            total: 240.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(quote_saved()).is_err());
        // Lossy emit never fails
        bus.emit_lossy(quote_saved());
        assert_eq!(bus.capacity(), 10);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(quote_saved()).unwrap(), 2);
        assert_eq!(rx1.recv().await.unwrap().event_type(), "QuoteSaved");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "QuoteSaved");

        drop(rx2);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SailorEvent::StockChanged {
            item_type: "anode".to_string(),
            item_id: "a1".to_string(),
            quantity_change: -2,
            on_hand: 8,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StockChanged");
        assert_eq!(json["on_hand"], 8);
    }
}
