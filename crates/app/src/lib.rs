//! Application layer.
//!
//! Commands come in as plain structs, the [`OrderService`] loads the
//! aggregate, applies the command and saves through the repository,
//! retrying the whole command when another writer got there first.

pub mod commands;
pub mod config;
pub mod error;
pub mod service;

pub use commands::{
    AddItem, CancelOrder, ConfirmOrder, CreateOrder, MarkDelivered, RemoveItem, SetShippingAddress,
    ShipOrder,
};
pub use config::Config;
pub use error::{AppError, ErrorKind};
pub use service::OrderService;
