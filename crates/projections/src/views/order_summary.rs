//! Order summary read model — one row per order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{CustomerId, EventId, OrderId, ProductId};
use domain::{DomainEvent, OrderEvent};

use crate::handler::EventHandler;

/// Denormalized per-order row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: String,
    /// Product -> (quantity, unit price in minor units).
    pub items: HashMap<ProductId, (u32, u64)>,
    pub total_amount: u64,
    pub updated_at: DateTime<Utc>,
}

impl OrderSummary {
    fn recompute_total(&mut self) {
        self.total_amount = self.items.values().fold(0u64, |acc, (qty, price)| {
            acc.saturating_add(u64::from(*qty).saturating_mul(*price))
        });
    }
}

struct OrderSummaryState {
    summaries: HashMap<OrderId, OrderSummary>,
    seen: HashSet<EventId>,
}

/// Read model view maintaining one summary row per order.
#[derive(Clone)]
pub struct OrderSummaryView {
    state: Arc<RwLock<OrderSummaryState>>,
}

impl OrderSummaryView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderSummaryState {
                summaries: HashMap::new(),
                seen: HashSet::new(),
            })),
        }
    }

    pub async fn get(&self, order_id: &OrderId) -> Option<OrderSummary> {
        self.state.read().await.summaries.get(order_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.summaries.len()
    }

    pub async fn orders_with_status(&self, status: &str) -> Vec<OrderSummary> {
        self.state
            .read()
            .await
            .summaries
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }
}

impl Default for OrderSummaryView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for OrderSummaryView {
    fn name(&self) -> &'static str {
        "OrderSummaryView"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            "OrderCreated",
            "OrderItemAdded",
            "OrderItemRemoved",
            "OrderConfirmed",
            "OrderShipped",
            "OrderDelivered",
            "OrderCancelled",
        ]
    }

    async fn handle(&self, event: &DomainEvent) -> crate::Result<()> {
        let mut state = self.state.write().await;
        if !state.seen.insert(event.event_id) {
            tracing::trace!(event_id = %event.event_id, "duplicate event ignored");
            return Ok(());
        }

        match &event.payload {
            OrderEvent::OrderCreated {
                order_id,
                customer_id,
                created_at,
            } => {
                state.summaries.insert(
                    order_id.clone(),
                    OrderSummary {
                        order_id: order_id.clone(),
                        customer_id: customer_id.clone(),
                        status: "Draft".to_string(),
                        items: HashMap::new(),
                        total_amount: 0,
                        updated_at: *created_at,
                    },
                );
            }
            OrderEvent::OrderItemAdded {
                product_id,
                quantity,
                unit_price,
            } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    let entry = summary
                        .items
                        .entry(product_id.clone())
                        .or_insert((0, unit_price.amount()));
                    entry.0 = entry.0.saturating_add(quantity.get());
                    summary.recompute_total();
                    summary.updated_at = event.occurred_at;
                }
            }
            OrderEvent::OrderItemRemoved { product_id } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    summary.items.remove(product_id);
                    summary.recompute_total();
                    summary.updated_at = event.occurred_at;
                }
            }
            OrderEvent::OrderConfirmed {
                total,
                confirmed_at,
            } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    summary.status = "Confirmed".to_string();
                    // The write side's total is authoritative.
                    summary.total_amount = total.amount();
                    summary.updated_at = *confirmed_at;
                }
            }
            OrderEvent::OrderShipped { shipped_at, .. } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    summary.status = "Shipped".to_string();
                    summary.updated_at = *shipped_at;
                }
            }
            OrderEvent::OrderDelivered { delivered_at } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    summary.status = "Delivered".to_string();
                    summary.updated_at = *delivered_at;
                }
            }
            OrderEvent::OrderCancelled { cancelled_at, .. } => {
                if let Some(summary) = state.summaries.get_mut(&event.order_id) {
                    summary.status = "Cancelled".to_string();
                    summary.updated_at = *cancelled_at;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Currency, Money, Order, ShippingAddress};

    fn usd(amount: u64) -> Money {
        Money::new(amount, Currency::USD)
    }

    async fn apply_all(view: &OrderSummaryView, events: &[DomainEvent]) {
        for event in events {
            view.handle(event).await.unwrap();
        }
    }

    #[tokio::test]
    async fn builds_summary_from_lifecycle_events() {
        let mut order = Order::create(CustomerId::parse("cust-1").unwrap());
        order
            .add_item(ProductId::parse("SKU-1").unwrap(), 2, usd(1500))
            .unwrap();
        order
            .set_shipping_address(
                ShippingAddress::new("1 Main St", "Springfield", "12345", "US").unwrap(),
            )
            .unwrap();
        order.confirm().unwrap();

        let view = OrderSummaryView::new();
        apply_all(&view, order.pending_events()).await;

        let summary = view.get(order.id()).await.unwrap();
        assert_eq!(summary.status, "Confirmed");
        assert_eq!(summary.total_amount, 3000);
        assert_eq!(
            summary.items[&ProductId::parse("SKU-1").unwrap()],
            (2, 1500)
        );
    }

    #[tokio::test]
    async fn duplicate_events_apply_once() {
        let mut order = Order::create(CustomerId::parse("cust-1").unwrap());
        order
            .add_item(ProductId::parse("SKU-1").unwrap(), 1, usd(1000))
            .unwrap();

        let view = OrderSummaryView::new();
        apply_all(&view, order.pending_events()).await;
        // Redelivery of the same envelope.
        apply_all(&view, order.pending_events()).await;

        let summary = view.get(order.id()).await.unwrap();
        assert_eq!(summary.items[&ProductId::parse("SKU-1").unwrap()].0, 1);
        assert_eq!(summary.total_amount, 1000);
    }

    #[tokio::test]
    async fn item_removal_updates_total() {
        let mut order = Order::create(CustomerId::parse("cust-1").unwrap());
        order
            .add_item(ProductId::parse("SKU-1").unwrap(), 2, usd(1000))
            .unwrap();
        order
            .add_item(ProductId::parse("SKU-2").unwrap(), 1, usd(500))
            .unwrap();
        order.remove_item(&ProductId::parse("SKU-1").unwrap()).unwrap();

        let view = OrderSummaryView::new();
        apply_all(&view, order.pending_events()).await;

        let summary = view.get(order.id()).await.unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.total_amount, 500);
    }

    #[tokio::test]
    async fn oversized_quantities_saturate_instead_of_wrapping() {
        use domain::Quantity;

        let order = Order::create(CustomerId::parse("cust-1").unwrap());
        let view = OrderSummaryView::new();
        apply_all(&view, order.pending_events()).await;

        // Two separate deliveries whose combined quantity and line
        // value exceed the integer ranges.
        for _ in 0..2 {
            let event = DomainEvent::new(
                order.id().clone(),
                OrderEvent::OrderItemAdded {
                    product_id: ProductId::parse("SKU-1").unwrap(),
                    quantity: Quantity::new(u32::MAX).unwrap(),
                    unit_price: Money::new(u64::MAX, Currency::USD),
                },
            );
            view.handle(&event).await.unwrap();
        }

        let summary = view.get(order.id()).await.unwrap();
        assert_eq!(summary.items[&ProductId::parse("SKU-1").unwrap()].0, u32::MAX);
        assert_eq!(summary.total_amount, u64::MAX);
    }

    #[tokio::test]
    async fn status_queries() {
        let mut a = Order::create(CustomerId::parse("cust-1").unwrap());
        let mut b = Order::create(CustomerId::parse("cust-2").unwrap());
        b.cancel("duplicate").unwrap();

        let view = OrderSummaryView::new();
        apply_all(&view, a.pending_events()).await;
        apply_all(&view, b.pending_events()).await;
        a.clear_pending_events();
        b.clear_pending_events();

        assert_eq!(view.count().await, 2);
        assert_eq!(view.orders_with_status("Draft").await.len(), 1);
        assert_eq!(view.orders_with_status("Cancelled").await.len(), 1);
    }
}
