//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reasons a line item cannot be placed in a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartItemError {
    /// The product ID is empty.
    #[error("product ID is required")]
    MissingProductId,
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The unit price is below zero.
    #[error("price cannot be negative: {0}")]
    NegativePrice(Decimal),
}

/// One product in the cart with its captured unit price and quantity.
///
/// Serialized with camelCase keys and the price as a decimal string, so a
/// persisted cart reloads with exactly the prices it was saved with. Prices
/// are read back from either a string or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Backend product identifier. Unique within a cart.
    pub product_id: String,
    /// Product display name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub price: Decimal,
    /// Number of units. Always at least 1 inside a cart.
    pub quantity: u32,
}

impl CartItem {
    /// Create a validated line item.
    ///
    /// # Errors
    ///
    /// Returns an error if the product ID is blank, the quantity is zero, or
    /// the price is negative.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Result<Self, CartItemError> {
        let item = Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check the line item invariants.
    ///
    /// # Errors
    ///
    /// See [`CartItem::new`].
    pub fn validate(&self) -> Result<(), CartItemError> {
        if self.product_id.trim().is_empty() {
            return Err(CartItemError::MissingProductId);
        }
        if self.quantity == 0 {
            return Err(CartItemError::ZeroQuantity);
        }
        if self.price < Decimal::ZERO {
            return Err(CartItemError::NegativePrice(self.price));
        }
        Ok(())
    }

    /// `price × quantity`, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(CartItem::new("P1", "Widget", d("10.00"), 1).is_ok());
        assert_eq!(
            CartItem::new("", "Widget", d("10.00"), 1),
            Err(CartItemError::MissingProductId)
        );
        assert_eq!(
            CartItem::new("  ", "Widget", d("10.00"), 1),
            Err(CartItemError::MissingProductId)
        );
        assert_eq!(
            CartItem::new("P1", "Widget", d("10.00"), 0),
            Err(CartItemError::ZeroQuantity)
        );
        assert_eq!(
            CartItem::new("P1", "Widget", d("-1"), 1),
            Err(CartItemError::NegativePrice(d("-1")))
        );
    }

    #[test]
    fn test_free_item_is_valid() {
        assert!(CartItem::new("P1", "Sticker", Decimal::ZERO, 3).is_ok());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem::new("P1", "Widget", d("2.50"), 4).unwrap();
        assert_eq!(item.line_total(), Some(d("10.00")));
    }

    #[test]
    fn test_line_total_overflow() {
        let item = CartItem::new("P1", "Yacht", d("100000000000000000000"), u32::MAX).unwrap();
        assert_eq!(item.line_total(), None);
    }

    #[test]
    fn test_json_layout() {
        let item = CartItem::new("P1", "Widget", d("2.5"), 2).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"productId": "P1", "name": "Widget", "price": "2.5", "quantity": 2})
        );
    }

    #[test]
    fn test_high_precision_price_survives_json() {
        let item = CartItem::new("P1", "Third", d("33.333333333333333333"), 1).unwrap();
        let json = serde_json::to_string(&item).unwrap();
        let back: CartItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
        assert_eq!(back.price.to_string(), "33.333333333333333333");
    }

    #[test]
    fn test_deserializes_integer_price() {
        let item: CartItem =
            serde_json::from_str(r#"{"productId":"P1","name":"Widget","price":10,"quantity":2}"#)
                .unwrap();
        assert_eq!(item.price, d("10"));

        let item: CartItem =
            serde_json::from_str(r#"{"productId":"P1","name":"Widget","price":2.5,"quantity":2}"#)
                .unwrap();
        assert_eq!(item.price, d("2.5"));
    }
}
