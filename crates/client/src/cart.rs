//! Client-side cart store.
//!
//! The cart is a list of line items keyed by product ID, mirrored to durable
//! storage under [`keys::CART_ITEMS`] after every mutation. Each mutation
//! builds the resulting item list, writes it, and only then swaps it into
//! memory, so the in-memory cart and the stored cart never disagree.

use std::sync::Arc;

use rust_decimal::Decimal;
use shopfront_core::{CartItem, CartItemError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{Storage, StorageError, keys};

/// Errors that can occur when mutating the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The line item failed validation.
    #[error(transparent)]
    Invalid(#[from] CartItemError),

    /// The cart total would not fit in a decimal. The cart is unchanged.
    #[error("cart total is too large")]
    TotalOverflow,

    /// The cart could not be written to storage. The cart is unchanged.
    #[error("failed to save cart: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be encoded.
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Owner of the in-progress order's line items.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    items: Vec<CartItem>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart from storage.
    ///
    /// A missing entry yields an empty cart. An unreadable or malformed entry
    /// (bad JSON, an invalid line item, a repeated product ID) is logged and
    /// also yields an empty cart.
    pub fn hydrate(storage: Arc<dyn Storage>) -> Self {
        let items = load_items(storage.as_ref());
        debug!(items = items.len(), "Cart hydrated");
        Self { storage, items }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Line item for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price × quantity` over all line items.
    ///
    /// Mutations that would overflow the total are rejected, so the sum of a
    /// stored cart always fits.
    #[must_use]
    pub fn total(&self) -> Decimal {
        checked_total(&self.items).unwrap_or(Decimal::MAX)
    }

    /// Add a line item, merging with an existing line for the same product.
    ///
    /// When the product is already in the cart its quantity grows by the new
    /// item's quantity; the existing name and price are kept.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Invalid` if the item has no product ID, a zero
    /// quantity or a negative price, `CartError::TotalOverflow` if the cart
    /// total would no longer fit, and `CartError::Storage` if the cart cannot
    /// be saved.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        item.validate()?;

        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            items.push(item);
        }

        self.commit(items)
    }

    /// Remove the line item for a product. Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    pub fn remove_item(&mut self, product_id: &str) -> Result<(), CartError> {
        if self.get(product_id).is_none() {
            return Ok(());
        }

        let items = self
            .items
            .iter()
            .filter(|item| item.product_id != product_id)
            .cloned()
            .collect();
        self.commit(items)
    }

    /// Set the quantity of a line item.
    ///
    /// A quantity of zero or less removes the item. Unknown products are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::TotalOverflow` if the cart total would no longer
    /// fit, and `CartError::Storage` if the cart cannot be saved.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        if self.get(product_id).is_none() {
            return Ok(());
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.product_id == product_id {
                    CartItem {
                        quantity,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.commit(items)
    }

    /// Remove every line item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be saved.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.commit(Vec::new())
    }

    /// Persist `items` and make them the current cart.
    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        checked_total(&items).ok_or(CartError::TotalOverflow)?;
        let encoded = serde_json::to_string(&items)?;
        self.storage.set(keys::CART_ITEMS, &encoded)?;
        debug!(items = items.len(), "Cart saved");
        self.items = items;
        Ok(())
    }
}

/// `Σ price × quantity`, or `None` on overflow.
fn checked_total(items: &[CartItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        sum.checked_add(item.line_total()?)
    })
}

/// Read the persisted cart, falling back to empty on any problem.
fn load_items(storage: &dyn Storage) -> Vec<CartItem> {
    let raw = match storage.get(keys::CART_ITEMS) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read saved cart, starting empty");
            return Vec::new();
        }
    };

    let items: Vec<CartItem> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Saved cart is not valid JSON, starting empty");
            return Vec::new();
        }
    };

    for (index, item) in items.iter().enumerate() {
        if let Err(e) = item.validate() {
            warn!(error = %e, index, "Saved cart has an invalid line item, starting empty");
            return Vec::new();
        }
        if items
            .iter()
            .take(index)
            .any(|earlier| earlier.product_id == item.product_id)
        {
            warn!(product_id = %item.product_id, "Saved cart repeats a product, starting empty");
            return Vec::new();
        }
    }

    if checked_total(&items).is_none() {
        warn!("Saved cart total overflows, starting empty");
        return Vec::new();
    }

    items
}
