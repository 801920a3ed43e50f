//! Persistence port for the order aggregate.

use async_trait::async_trait;
use thiserror::Error;

use common::OrderId;

use crate::order::Order;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Another writer saved this order since it was loaded. The caller
    /// should reload the aggregate and retry the whole command.
    #[error("concurrency conflict on order {order_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: i64,
        actual: i64,
    },

    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a backend error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RepositoryError::Storage(Box::new(err))
    }
}

/// Write-side persistence contract for orders.
///
/// `save` must persist the aggregate snapshot and its pending events
/// in one atomic unit: either both land or neither does. On success
/// the implementation bumps the aggregate's version; the caller clears
/// the pending event buffer.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order by ID, or `None` if it does not exist.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Persists the aggregate and its pending events atomically,
    /// enforcing the optimistic version check.
    async fn save(&self, order: &mut Order) -> Result<(), RepositoryError>;

    /// Removes an order and its line items.
    async fn delete(&self, order: &Order) -> Result<(), RepositoryError>;
}
