//! Outbox-to-dispatcher bridge.

use std::sync::Arc;

use async_trait::async_trait;

use domain::DomainEvent;
use outbox::{EventPublisher, OutboxRecord, PublishError};

use crate::dispatcher::EventDispatcher;

/// In-process publisher that feeds outbox records straight into the
/// projection dispatcher.
///
/// Any decode or handler failure is reported as a publish failure, so
/// the relay keeps the record unprocessed and redelivers it later.
pub struct PublisherBridge {
    dispatcher: Arc<EventDispatcher>,
}

impl PublisherBridge {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventPublisher for PublisherBridge {
    async fn publish(&self, record: &OutboxRecord) -> Result<(), PublishError> {
        let event: DomainEvent = serde_json::from_value(record.payload.clone())
            .map_err(|err| PublishError::new(record.id, format!("decode: {err}")))?;
        self.dispatcher
            .dispatch(&event)
            .await
            .map_err(|err| PublishError::new(record.id, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::order_summary::OrderSummaryView;
    use domain::{CustomerId, Order};

    #[tokio::test]
    async fn bridge_feeds_views_from_records() {
        let view = OrderSummaryView::new();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(view.clone()));
        let bridge = PublisherBridge::new(Arc::new(dispatcher));

        let order = Order::create(CustomerId::parse("cust-1").unwrap());
        let record = OutboxRecord::from_event(&order.pending_events()[0]).unwrap();

        bridge.publish(&record).await.unwrap();
        assert!(view.get(order.id()).await.is_some());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_publish_failure() {
        let bridge = PublisherBridge::new(Arc::new(EventDispatcher::new()));

        let order = Order::create(CustomerId::parse("cust-1").unwrap());
        let mut record = OutboxRecord::from_event(&order.pending_events()[0]).unwrap();
        record.payload = serde_json::json!({"not": "an event"});

        assert!(bridge.publish(&record).await.is_err());
    }
}
