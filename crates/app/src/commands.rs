//! Order commands.
//!
//! Plain data carried from the outer edge to the service. Validation
//! of the values inside happens in the domain layer.

use common::{CustomerId, OrderId, ProductId};
use domain::{Money, ShippingAddress};

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
}

impl CreateOrder {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self { customer_id }
    }
}

#[derive(Debug, Clone)]
pub struct AddItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Debug, Clone)]
pub struct RemoveItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
}

#[derive(Debug, Clone)]
pub struct SetShippingAddress {
    pub order_id: OrderId,
    pub address: ShippingAddress,
}

#[derive(Debug, Clone)]
pub struct ConfirmOrder {
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct ShipOrder {
    pub order_id: OrderId,
    pub tracking_number: String,
}

#[derive(Debug, Clone)]
pub struct MarkDelivered {
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: String,
}
