//! Domain events recorded by the order aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{CustomerId, EventId, OrderId, ProductId};

use super::value_objects::{Money, Quantity};

/// A fact that happened to an order.
///
/// Events are serialized with an external `type` tag and a `data`
/// payload so consumers can route on the tag without decoding the
/// whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    OrderCreated {
        order_id: OrderId,
        customer_id: CustomerId,
        created_at: DateTime<Utc>,
    },
    OrderItemAdded {
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Money,
    },
    OrderItemRemoved {
        product_id: ProductId,
    },
    OrderConfirmed {
        total: Money,
        confirmed_at: DateTime<Utc>,
    },
    OrderShipped {
        tracking_number: String,
        shipped_at: DateTime<Utc>,
    },
    OrderDelivered {
        delivered_at: DateTime<Utc>,
    },
    OrderCancelled {
        reason: String,
        cancelled_at: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Stable type tag used for routing and storage.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "OrderCreated",
            OrderEvent::OrderItemAdded { .. } => "OrderItemAdded",
            OrderEvent::OrderItemRemoved { .. } => "OrderItemRemoved",
            OrderEvent::OrderConfirmed { .. } => "OrderConfirmed",
            OrderEvent::OrderShipped { .. } => "OrderShipped",
            OrderEvent::OrderDelivered { .. } => "OrderDelivered",
            OrderEvent::OrderCancelled { .. } => "OrderCancelled",
        }
    }
}

/// An order event together with its identity and provenance.
///
/// The envelope is what crosses process boundaries: the `event_id`
/// lets downstream consumers deduplicate redeliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
    pub payload: OrderEvent,
}

impl DomainEvent {
    /// Wraps a payload in a fresh envelope.
    pub fn new(order_id: OrderId, payload: OrderEvent) -> Self {
        Self {
            event_id: EventId::new(),
            order_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Type tag of the wrapped payload.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
