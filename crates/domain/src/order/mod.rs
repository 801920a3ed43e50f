//! Order aggregate and related types.

mod aggregate;
mod events;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use events::{DomainEvent, OrderEvent};
pub use state::OrderStatus;
pub use value_objects::{Currency, Money, OrderItem, Quantity, ShippingAddress};

use common::ProductId;
use thiserror::Error;

/// Errors raised by order operations and value object construction.
///
/// All of these are synchronous contract violations. None are retried;
/// they propagate to the caller as request rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order's current state does not permit the attempted action.
    #[error("cannot {action} an order in {status} state")]
    InvalidOrderState {
        status: OrderStatus,
        action: &'static str,
    },

    /// No line item exists for the given product.
    #[error("no item for product {product_id} in this order")]
    OrderItemNotFound { product_id: ProductId },

    /// Quantity must be a positive integer.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// A monetary operation would produce an invalid amount.
    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: &'static str },

    /// Monetary values in two different currencies cannot be combined.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    /// The currency code is not a valid ISO 4217 alphabetic code.
    #[error("invalid currency code: {code:?}")]
    InvalidCurrency { code: String },

    /// Orders need at least one item before confirmation.
    #[error("cannot confirm an order with no items")]
    EmptyOrder,

    /// Orders need a shipping address before confirmation.
    #[error("cannot confirm an order without a shipping address")]
    MissingShippingAddress,

    /// A shipping address field was empty.
    #[error("shipping address {field} cannot be empty")]
    InvalidAddress { field: &'static str },
}
