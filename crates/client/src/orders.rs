//! Order history.
//!
//! The backend returns one record per order line, with the order's total and
//! creation time repeated on every line. [`group_orders`] folds them back
//! into orders.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use shopfront_core::{OrderId, UserId};
use tracing::instrument;

use crate::amount;
use crate::api::{ApiClient, ApiError};

/// One line of a past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_id: OrderId,
    #[serde(deserialize_with = "amount::deserialize")]
    pub total: Decimal,
    pub created_at: String,
    pub product_id: String,
    pub quantity: u32,
    #[serde(deserialize_with = "amount::deserialize")]
    pub price_at_purchase: Decimal,
}

impl OrderLine {
    /// `price_at_purchase * quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price_at_purchase.checked_mul(Decimal::from(self.quantity))
    }
}

/// The lines of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
}

impl OrderSummary {
    /// Order total as recorded by the backend.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.first().map_or(Decimal::ZERO, |line| line.total)
    }

    /// Creation time of the order.
    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        self.lines.first().map(|line| line.created_at.as_str())
    }
}

/// Fetch a user's order lines, optionally limited to one day.
///
/// # Errors
///
/// Returns an error if the request fails or the lines cannot be decoded.
#[instrument(skip(api, token))]
pub async fn list_orders(
    api: &ApiClient,
    user_id: UserId,
    date: Option<NaiveDate>,
    token: &SecretString,
) -> Result<Vec<OrderLine>, ApiError> {
    let endpoint = date.map_or_else(
        || format!("/orders/{user_id}"),
        |day| format!("/orders/{user_id}?date={}", day.format("%Y-%m-%d")),
    );
    let lines: Option<Vec<OrderLine>> = api.get(&endpoint, Some(token)).await?;
    Ok(lines.unwrap_or_default())
}

/// Group order lines by order, ascending by order ID. Lines keep their
/// relative order within each group.
#[must_use]
pub fn group_orders(lines: Vec<OrderLine>) -> Vec<OrderSummary> {
    let mut groups: BTreeMap<OrderId, Vec<OrderLine>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.order_id).or_default().push(line);
    }
    groups
        .into_iter()
        .map(|(order_id, lines)| OrderSummary { order_id, lines })
        .collect()
}
