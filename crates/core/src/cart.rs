//! Shopping cart and checkout totals.
//!
//! Totals are a pure function of the line items and the delivery method:
//!
//! ```text
//! subtotal = Σ price × quantity
//! tax      = subtotal × 10%
//! shipping = 0 for pickup, the zone's fee for delivery
//! total    = subtotal + tax + shipping
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::DeliveryZone;
use crate::types::{PickupLocationId, Price, ProductId, VariantId, ZoneId};

/// Fixed sales tax rate (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Errors from cart operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("no cart line {0}")]
    LineNotFound(String),
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// A product (optionally a specific variant) in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// Stable identifier of the line, unique per product and variant.
    #[must_use]
    pub fn line_id(&self) -> String {
        match &self.variant_id {
            Some(variant) => format!("{}:{variant}", self.product_id),
            None => self.product_id.to_string(),
        }
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn same_line(&self, other: &Self) -> bool {
        self.product_id == other.product_id && self.variant_id == other.variant_id
    }
}

/// How the order reaches the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum DeliveryMethod {
    /// Collected in person; no shipping fee.
    #[serde(rename_all = "camelCase")]
    Pickup {
        #[serde(default)]
        location_id: Option<PickupLocationId>,
    },
    /// Delivered by rider at the zone's flat fee.
    #[serde(rename_all = "camelCase")]
    Delivery {
        zone_id: ZoneId,
        zone_name: String,
        fee: Decimal,
    },
}

impl Default for DeliveryMethod {
    fn default() -> Self {
        Self::Pickup { location_id: None }
    }
}

impl DeliveryMethod {
    /// Delivery through the given zone.
    #[must_use]
    pub fn delivery(zone: &DeliveryZone) -> Self {
        Self::Delivery {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            fee: zone.delivery_fee,
        }
    }

    /// Shipping charged for this method.
    #[must_use]
    pub const fn shipping(&self) -> Decimal {
        match self {
            Self::Pickup { .. } => Decimal::ZERO,
            Self::Delivery { fee, .. } => *fee,
        }
    }

    #[must_use]
    pub const fn is_pickup(&self) -> bool {
        matches!(self, Self::Pickup { .. })
    }
}

/// Computed cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Totals for the given items and delivery method.
    #[must_use]
    pub fn calculate(items: &[CartItem], delivery: &DeliveryMethod) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let tax = subtotal * TAX_RATE;
        let shipping = delivery.shipping();
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    /// The total as a display price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::ghs(self.total)
    }
}

/// The shopper's cart, kept in their session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub delivery: DeliveryMethod,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::calculate(&self.items, &self.delivery)
    }

    /// Add an item, merging with an existing line for the same variant.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` if the item's quantity is zero.
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        match self.items.iter_mut().find(|line| line.same_line(&item)) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has the given id.
    pub fn set_quantity(&mut self, line_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(line_id);
        }
        let line = self
            .items
            .iter_mut()
            .find(|line| line.line_id() == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_owned()))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Increase a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has the given id.
    pub fn increment(&mut self, line_id: &str) -> Result<(), CartError> {
        let quantity = self.quantity_of(line_id)?;
        self.set_quantity(line_id, quantity.saturating_add(1))
    }

    /// Decrease a line's quantity by one; a line at 1 is removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has the given id.
    pub fn decrement(&mut self, line_id: &str) -> Result<(), CartError> {
        let quantity = self.quantity_of(line_id)?;
        self.set_quantity(line_id, quantity.saturating_sub(1))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has the given id.
    pub fn remove(&mut self, line_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|line| line.line_id() != line_id);
        if self.items.len() == before {
            return Err(CartError::LineNotFound(line_id.to_owned()));
        }
        Ok(())
    }

    pub fn set_delivery(&mut self, delivery: DeliveryMethod) {
        self.delivery = delivery;
    }

    /// Empty the cart after a completed checkout. The delivery choice resets
    /// to pickup.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn quantity_of(&self, line_id: &str) -> Result<u32, CartError> {
        self.items
            .iter()
            .find(|line| line.line_id() == line_id)
            .map(|line| line.quantity)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_owned()))
    }
}
