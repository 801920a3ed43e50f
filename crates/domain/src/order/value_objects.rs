//! Value objects for the order domain.
//!
//! All types here are immutable, compare by value, and validate
//! themselves at construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::ProductId;

use super::OrderError;

/// ISO 4217 alphabetic currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    /// United States dollar.
    pub const USD: Currency = Currency(*b"USD");

    /// Euro.
    pub const EUR: Currency = Currency(*b"EUR");

    /// Creates a currency from a three-letter alphabetic code.
    pub fn new(code: &str) -> Result<Self, OrderError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(OrderError::InvalidCurrency {
                code: code.to_string(),
            });
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Validated as ASCII uppercase at construction.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Currency::new(&code).map_err(serde::de::Error::custom)
    }
}

/// A monetary amount in minor units (e.g. cents) with a currency.
///
/// Amounts are unsigned: a `Money` can never hold a negative value,
/// and `subtract` fails rather than go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: u64,
    currency: Currency,
}

impl Money {
    /// Creates a money value from minor units.
    pub fn new(amount: u64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), OrderError> {
        if self.currency != other.currency {
            return Err(OrderError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        Ok(())
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, OrderError> {
        self.require_same_currency(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(OrderError::InvalidAmount {
                reason: "addition overflow",
            })?;
        Ok(Money {
            amount,
            currency: self.currency,
        })
    }

    /// Subtracts another amount of the same currency.
    ///
    /// Fails with `InvalidAmount` if the result would be negative.
    pub fn subtract(&self, other: Money) -> Result<Money, OrderError> {
        self.require_same_currency(&other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(OrderError::InvalidAmount {
                reason: "subtraction below zero",
            })?;
        Ok(Money {
            amount,
            currency: self.currency,
        })
    }

    /// Multiplies the amount by an integer factor, saturating at the
    /// maximum representable amount so derived totals never panic or
    /// wrap.
    pub fn multiply(&self, factor: u32) -> Money {
        Money {
            amount: self.amount.saturating_mul(u64::from(factor)),
            currency: self.currency,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.amount / 100,
            self.amount % 100,
            self.currency
        )
    }
}

/// A strictly positive item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Creates a quantity, rejecting zero.
    pub fn new(value: u32) -> Result<Self, OrderError> {
        if value == 0 {
            return Err(OrderError::InvalidQuantity { quantity: value });
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Sums two quantities, rejecting overflow.
    pub fn add(&self, other: Quantity) -> Result<Quantity, OrderError> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or(OrderError::InvalidAmount {
                reason: "quantity overflow",
            })
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A postal shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    street: String,
    city: String,
    postal_code: String,
    country: String,
}

impl ShippingAddress {
    /// Creates an address, rejecting empty fields.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, OrderError> {
        let address = Self {
            street: street.into(),
            city: city.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        };
        for (field, value) in [
            ("street", &address.street),
            ("city", &address.city),
            ("postal_code", &address.postal_code),
            ("country", &address.country),
        ] {
            if value.trim().is_empty() {
                return Err(OrderError::InvalidAddress { field });
            }
        }
        Ok(address)
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

/// A line item within an order.
///
/// The unit price is captured when the item is added and never
/// recomputed from the catalog, preserving historical pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    item_id: String,
    product_id: ProductId,
    quantity: Quantity,
    unit_price: Money,
}

impl OrderItem {
    /// Creates a new line item with a generated item ID.
    pub fn new(product_id: ProductId, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Reconstructs a line item from stored values.
    pub fn rehydrate(
        item_id: impl Into<String>,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Money,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Total price for this line (unit price times quantity).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity.get())
    }

    /// Folds additional units into this line. Fails without mutating
    /// when the combined quantity does not fit.
    pub(crate) fn merge(&mut self, additional: Quantity) -> Result<(), OrderError> {
        self.quantity = self.quantity.add(additional)?;
        Ok(())
    }
}
