//! Command service over the order repository.

use std::sync::Arc;

use common::OrderId;
use domain::{Order, OrderError, OrderRepository, RepositoryError};

use crate::commands::{
    AddItem, CancelOrder, ConfirmOrder, CreateOrder, MarkDelivered, RemoveItem,
    SetShippingAddress, ShipOrder,
};
use crate::error::AppError;

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Executes order commands with load-apply-save semantics.
///
/// A concurrency conflict means the loaded aggregate went stale
/// between load and save; the whole command is retried against a
/// fresh copy, up to a bounded number of attempts.
pub struct OrderService<R> {
    repository: Arc<R>,
    max_retries: u32,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderId, AppError> {
        let mut order = Order::create(cmd.customer_id);
        self.repository.save(&mut order).await?;
        order.clear_pending_events();
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), "order created");
        Ok(order.id().clone())
    }

    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order, AppError> {
        self.repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_id.clone()))
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn add_item(&self, cmd: AddItem) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| {
            order.add_item(cmd.product_id.clone(), cmd.quantity, cmd.unit_price)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn remove_item(&self, cmd: RemoveItem) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| order.remove_item(&cmd.product_id))
            .await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn set_shipping_address(&self, cmd: SetShippingAddress) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| {
            order.set_shipping_address(cmd.address.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn confirm_order(&self, cmd: ConfirmOrder) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| order.confirm()).await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn ship_order(&self, cmd: ShipOrder) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| {
            order.ship(cmd.tracking_number.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn mark_delivered(&self, cmd: MarkDelivered) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| order.mark_delivered())
            .await
    }

    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn cancel_order(&self, cmd: CancelOrder) -> Result<(), AppError> {
        self.execute(&cmd.order_id, |order| order.cancel(cmd.reason.clone()))
            .await
    }

    /// Loads the order, applies the command and saves, retrying the
    /// whole cycle on optimistic-concurrency conflicts.
    async fn execute<F>(&self, order_id: &OrderId, apply: F) -> Result<(), AppError>
    where
        F: Fn(&mut Order) -> Result<(), OrderError>,
    {
        let mut attempt = 0;
        loop {
            let mut order = self
                .repository
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| AppError::OrderNotFound(order_id.clone()))?;

            apply(&mut order)?;

            match self.repository.save(&mut order).await {
                Ok(()) => {
                    order.clear_pending_events();
                    return Ok(());
                }
                Err(RepositoryError::ConcurrencyConflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    metrics::counter!("order_command_retries_total").increment(1);
                    tracing::debug!(%order_id, attempt, "conflict, retrying command");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
