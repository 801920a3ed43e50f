//! Shared identifier types used across the order system.

pub mod ids;

pub use ids::{CustomerId, EventId, IdError, OrderId, ProductId};
