//! The `Order` aggregate root.
//!
//! The aggregate holds the current state of an order and enforces the
//! business rules on every transition. Each successful command appends
//! one or more [`DomainEvent`]s to a pending buffer; the repository
//! persists those events atomically with the state and the caller
//! clears the buffer after a successful save.

use chrono::{DateTime, Utc};

use common::{CustomerId, OrderId, ProductId};

use super::events::{DomainEvent, OrderEvent};
use super::state::OrderStatus;
use super::value_objects::{Currency, Money, OrderItem, Quantity, ShippingAddress};
use super::OrderError;

/// A customer order.
///
/// State-stored: the struct itself is the source of truth and is
/// persisted as a snapshot, not rebuilt from events.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    shipping_address: Option<ShippingAddress>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    version: i64,
    pending_events: Vec<DomainEvent>,
}

impl Order {
    /// Creates a new draft order for a customer.
    pub fn create(customer_id: CustomerId) -> Self {
        let id = OrderId::generate();
        let created_at = Utc::now();
        let mut order = Self {
            id: id.clone(),
            customer_id: customer_id.clone(),
            items: Vec::new(),
            status: OrderStatus::Draft,
            shipping_address: None,
            created_at,
            confirmed_at: None,
            version: 0,
            pending_events: Vec::new(),
        };
        order.record(OrderEvent::OrderCreated {
            order_id: id,
            customer_id,
            created_at,
        });
        order
    }

    /// Reconstructs an order from persisted state without recording
    /// any events.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        status: OrderStatus,
        shipping_address: Option<ShippingAddress>,
        created_at: DateTime<Utc>,
        confirmed_at: Option<DateTime<Utc>>,
        version: i64,
    ) -> Self {
        Self {
            id,
            customer_id,
            items,
            status,
            shipping_address,
            created_at,
            confirmed_at,
            version,
            pending_events: Vec::new(),
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    /// Persistence version used for optimistic concurrency checks.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Adds units of a product to the order.
    ///
    /// If the product is already present the quantities are merged
    /// into the existing line item. The unit price of all items must
    /// share one currency.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "add an item to",
            });
        }
        let quantity = Quantity::new(quantity)?;
        if let Some(first) = self.items.first() {
            if first.unit_price().currency() != unit_price.currency() {
                return Err(OrderError::CurrencyMismatch {
                    expected: first.unit_price().currency(),
                    found: unit_price.currency(),
                });
            }
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id() == &product_id)
        {
            Some(existing) => existing.merge(quantity)?,
            None => self
                .items
                .push(OrderItem::new(product_id.clone(), quantity, unit_price)),
        }

        self.record(OrderEvent::OrderItemAdded {
            product_id,
            quantity,
            unit_price,
        });
        Ok(())
    }

    /// Removes the line item for a product entirely.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "remove an item from",
            });
        }
        let position = self
            .items
            .iter()
            .position(|item| item.product_id() == product_id)
            .ok_or_else(|| OrderError::OrderItemNotFound {
                product_id: product_id.clone(),
            })?;
        self.items.remove(position);
        self.record(OrderEvent::OrderItemRemoved {
            product_id: product_id.clone(),
        });
        Ok(())
    }

    /// Sets or replaces the shipping address.
    pub fn set_shipping_address(&mut self, address: ShippingAddress) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "change the address of",
            });
        }
        self.shipping_address = Some(address);
        Ok(())
    }

    /// Confirms the order, freezing its contents.
    ///
    /// Requires at least one item and a shipping address.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "confirm",
            });
        }
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if self.shipping_address.is_none() {
            return Err(OrderError::MissingShippingAddress);
        }
        let confirmed_at = Utc::now();
        self.status = OrderStatus::Confirmed;
        self.confirmed_at = Some(confirmed_at);
        self.record(OrderEvent::OrderConfirmed {
            total: self.total(),
            confirmed_at,
        });
        Ok(())
    }

    /// Marks the order as handed to the carrier.
    pub fn ship(&mut self, tracking_number: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_ship() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "ship",
            });
        }
        self.status = OrderStatus::Shipped;
        self.record(OrderEvent::OrderShipped {
            tracking_number: tracking_number.into(),
            shipped_at: Utc::now(),
        });
        Ok(())
    }

    /// Marks the order as received by the customer.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        if !self.status.can_deliver() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "deliver",
            });
        }
        self.status = OrderStatus::Delivered;
        self.record(OrderEvent::OrderDelivered {
            delivered_at: Utc::now(),
        });
        Ok(())
    }

    /// Cancels the order before shipment.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidOrderState {
                status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        self.record(OrderEvent::OrderCancelled {
            reason: reason.into(),
            cancelled_at: Utc::now(),
        });
        Ok(())
    }

    /// Grand total across all line items.
    ///
    /// An order with no items totals zero dollars.
    pub fn total(&self) -> Money {
        let currency = self
            .items
            .first()
            .map(|item| item.unit_price().currency())
            .unwrap_or(Currency::USD);
        let amount = self
            .items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.subtotal().amount()));
        Money::new(amount, currency)
    }

    /// Events recorded since the last save.
    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.pending_events
    }

    /// Drops the pending buffer after the repository has persisted it.
    pub fn clear_pending_events(&mut self) {
        self.pending_events.clear();
    }

    /// Called by the repository after a successful save.
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn record(&mut self, payload: OrderEvent) {
        self.pending_events
            .push(DomainEvent::new(self.id.clone(), payload));
    }
}
