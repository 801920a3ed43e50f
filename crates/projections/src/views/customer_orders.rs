//! Customer orders read model — per-customer order statistics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{CustomerId, EventId, OrderId};
use domain::{DomainEvent, OrderEvent};

use crate::handler::EventHandler;

/// Per-customer order statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerOrdersSummary {
    pub total_orders: u64,
    pub active_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of confirmed order totals, in minor units.
    pub confirmed_spend: u64,
}

struct CustomerOrdersState {
    customers: HashMap<CustomerId, CustomerOrdersSummary>,
    /// Maps order_id -> customer_id for lifecycle events that carry
    /// only the order ID.
    order_to_customer: HashMap<OrderId, CustomerId>,
    seen: HashSet<EventId>,
}

/// Read model view counting orders per customer.
#[derive(Clone)]
pub struct CustomerOrdersView {
    state: Arc<RwLock<CustomerOrdersState>>,
}

impl CustomerOrdersView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CustomerOrdersState {
                customers: HashMap::new(),
                order_to_customer: HashMap::new(),
                seen: HashSet::new(),
            })),
        }
    }

    pub async fn get_customer(&self, customer_id: &CustomerId) -> Option<CustomerOrdersSummary> {
        self.state.read().await.customers.get(customer_id).cloned()
    }

    pub async fn customer_count(&self) -> usize {
        self.state.read().await.customers.len()
    }
}

impl Default for CustomerOrdersView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for CustomerOrdersView {
    fn name(&self) -> &'static str {
        "CustomerOrdersView"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            "OrderCreated",
            "OrderConfirmed",
            "OrderDelivered",
            "OrderCancelled",
        ]
    }

    async fn handle(&self, event: &DomainEvent) -> crate::Result<()> {
        let mut state = self.state.write().await;
        if !state.seen.insert(event.event_id) {
            return Ok(());
        }

        match &event.payload {
            OrderEvent::OrderCreated {
                order_id,
                customer_id,
                ..
            } => {
                state
                    .order_to_customer
                    .insert(order_id.clone(), customer_id.clone());
                let entry = state.customers.entry(customer_id.clone()).or_default();
                entry.total_orders += 1;
                entry.active_orders += 1;
            }
            OrderEvent::OrderConfirmed { total, .. } => {
                if let Some(customer_id) = state.order_to_customer.get(&event.order_id).cloned()
                    && let Some(entry) = state.customers.get_mut(&customer_id)
                {
                    entry.confirmed_spend = entry.confirmed_spend.saturating_add(total.amount());
                }
            }
            OrderEvent::OrderDelivered { .. } => {
                if let Some(customer_id) = state.order_to_customer.get(&event.order_id).cloned()
                    && let Some(entry) = state.customers.get_mut(&customer_id)
                {
                    entry.active_orders = entry.active_orders.saturating_sub(1);
                    entry.delivered_orders += 1;
                }
            }
            OrderEvent::OrderCancelled { .. } => {
                if let Some(customer_id) = state.order_to_customer.get(&event.order_id).cloned()
                    && let Some(entry) = state.customers.get_mut(&customer_id)
                {
                    entry.active_orders = entry.active_orders.saturating_sub(1);
                    entry.cancelled_orders += 1;
                }
            }
            _ => {}
        }

        Ok(())
    }
}
