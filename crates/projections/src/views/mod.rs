//! Concrete read-model views.

pub mod customer_orders;
pub mod order_summary;
