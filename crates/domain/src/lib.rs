//! Domain layer for the order system.
//!
//! This crate provides the write-side domain model:
//! - Self-validating value objects (`Money`, `Quantity`, `ShippingAddress`)
//! - The `Order` aggregate root with its lifecycle state machine
//! - Domain events recorded by aggregate operations
//! - The `OrderRepository` persistence port

pub mod order;
pub mod repository;

pub use common::{CustomerId, EventId, IdError, OrderId, ProductId};
pub use order::{
    Currency, DomainEvent, Money, Order, OrderError, OrderEvent, OrderItem, OrderStatus, Quantity,
    ShippingAddress,
};
pub use repository::{OrderRepository, RepositoryError};
