//! Read-model projections.
//!
//! Events leave the write side through the outbox relay and arrive
//! here via the [`PublisherBridge`], which decodes each record and
//! routes it through the [`EventDispatcher`] to every registered
//! [`EventHandler`]. Delivery is at-least-once, so every view
//! deduplicates on event ID before applying anything.

pub mod bridge;
pub mod dispatcher;
pub mod handler;
pub mod views;

pub use bridge::PublisherBridge;
pub use dispatcher::EventDispatcher;
pub use handler::{EventHandler, ProjectionError};
pub use views::customer_orders::{CustomerOrdersSummary, CustomerOrdersView};
pub use views::order_summary::{OrderSummary, OrderSummaryView};

pub type Result<T> = std::result::Result<T, ProjectionError>;
