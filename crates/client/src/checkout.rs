//! Order submission from the current cart.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shopfront_core::UserId;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartError, CartStore};
use crate::session::{AuthError, SessionStore};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No user is logged in.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The backend rejected the order. The cart is unchanged.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The order was placed but the cart could not be cleared afterwards.
    #[error("order placed but the cart could not be cleared: {source}")]
    CartNotCleared {
        /// Order record returned by the backend.
        order: Value,
        /// Why clearing failed.
        #[source]
        source: CartError,
    },
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub items: Vec<OrderItemRequest>,
}

/// One line of an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_purchase: Decimal,
}

impl OrderRequest {
    /// Snapshot the cart as an order for `user_id`.
    #[must_use]
    pub fn from_cart(user_id: UserId, cart: &CartStore) -> Self {
        Self {
            user_id,
            total: cart.total(),
            items: cart
                .items()
                .iter()
                .map(|item| OrderItemRequest {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    price_at_purchase: item.price,
                })
                .collect(),
        }
    }
}

/// Place an order for everything in the cart, then empty the cart.
///
/// Returns the order record created by the backend.
///
/// # Errors
///
/// - `CheckoutError::Auth` when nobody is logged in
/// - `CheckoutError::EmptyCart` when the cart has no items
/// - `CheckoutError::Api` when the backend rejects the order (cart kept)
/// - `CheckoutError::CartNotCleared` when the order went through but the
///   emptied cart could not be saved
#[instrument(skip_all, fields(items = cart.len()))]
pub async fn checkout(
    api: &ApiClient,
    session: &SessionStore,
    cart: &mut CartStore,
) -> Result<Value, CheckoutError> {
    let current = session.require_session()?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let request = OrderRequest::from_cart(current.user.id, cart);
    let order: Value = api.post("/orders", &request, Some(&current.token)).await?;
    info!(user_id = %current.user.id, total = %request.total, "Order placed");

    if let Err(source) = cart.clear() {
        error!(error = %source, "Failed to clear cart after checkout");
        return Err(CheckoutError::CartNotCleared { order, source });
    }

    Ok(order)
}
