//! Outbox row representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{EventId, OrderId};
use domain::DomainEvent;

/// One pending (or delivered) event in the outbox.
///
/// The record ID is the event ID, so redelivered records keep a
/// stable identity all the way to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: EventId,
    pub order_id: OrderId,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    /// Builds an unprocessed record from a domain event. The payload
    /// is the full event envelope, serialized as JSON.
    pub fn from_event(event: &DomainEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: event.event_id,
            order_id: event.order_id.clone(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_value(event)?,
            created_at: event.occurred_at,
            processed_at: None,
            claimed_by: None,
            claimed_at: None,
        })
    }

    /// True once the relay has confirmed delivery.
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CustomerId, Order};

    #[test]
    fn from_event_carries_envelope() {
        let order = Order::create(CustomerId::parse("cust-1").unwrap());
        let event = &order.pending_events()[0];

        let record = OutboxRecord::from_event(event).unwrap();
        assert_eq!(record.id, event.event_id);
        assert_eq!(record.order_id, *order.id());
        assert_eq!(record.event_type, "OrderCreated");
        assert!(!record.is_processed());
        assert!(record.claimed_by.is_none());

        // The payload decodes back into the same envelope.
        let decoded: DomainEvent = serde_json::from_value(record.payload.clone()).unwrap();
        assert_eq!(&decoded, event);
    }
}
