//! Product catalog: listing for shoppers, management for admins.
//!
//! The backend is loose about product records (`_id` or `id`, string or
//! numeric IDs, prices as numbers or numeric strings), so every record goes
//! through [`Product::from_raw`] before the rest of the client sees it.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::amount;
use crate::api::{ApiClient, ApiError};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A product form field is blank or out of range.
    #[error("please fill all fields: {0}")]
    InvalidInput(&'static str),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend returned a product record that could not be normalized.
    #[error("unexpected product record: {0}")]
    UnexpectedRecord(String),
}

/// Listing order for `GET /products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort order: {s} (expected asc or desc)")),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub updated_at: Option<String>,
}

/// Product record as the backend returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    #[serde(rename = "_id", default)]
    mongo_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    name: String,
    price: Value,
    #[serde(default)]
    category: String,
    #[serde(default)]
    updated_at: Option<Value>,
}

impl Product {
    /// Normalize one backend product record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnexpectedRecord` if the record has no usable
    /// ID or its price is neither a number nor a numeric string.
    pub fn from_raw(raw: Value) -> Result<Self, CatalogError> {
        let raw: RawProduct = serde_json::from_value(raw)
            .map_err(|e| CatalogError::UnexpectedRecord(e.to_string()))?;

        let id = raw
            .mongo_id
            .as_ref()
            .and_then(id_string)
            .or_else(|| raw.id.as_ref().and_then(id_string))
            .ok_or_else(|| CatalogError::UnexpectedRecord("missing product id".to_string()))?;

        let price = amount::parse(&raw.price).ok_or_else(|| {
            CatalogError::UnexpectedRecord(format!("product {id} has invalid price {}", raw.price))
        })?;

        let updated_at = raw.updated_at.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(Self {
            id,
            sku: raw.sku,
            name: raw.name,
            price,
            category: raw.category,
            updated_at,
        })
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Admin product form, validated and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    sku: String,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    category: String,
}

impl ProductInput {
    /// Build a product form from raw field values.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` naming the first blank field, or
    /// `price` when the price is negative.
    pub fn new(sku: &str, name: &str, price: Decimal, category: &str) -> Result<Self, CatalogError> {
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(CatalogError::InvalidInput(field))
            } else {
                Ok(value.to_string())
            }
        };

        let sku = required(sku, "sku")?;
        let name = required(name, "name")?;
        let category = required(category, "category")?;
        if price < Decimal::ZERO {
            return Err(CatalogError::InvalidInput("price"));
        }

        Ok(Self {
            sku,
            name,
            price,
            category,
        })
    }

    #[must_use]
    pub fn sku(&self) -> &str {
        &self.sku
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

// =============================================================================
// Backend calls
// =============================================================================

/// List products, optionally sorted.
///
/// A response that is not an array yields an empty list. Records that cannot
/// be normalized are skipped with a warning.
///
/// # Errors
///
/// Returns `CatalogError::Api` if the request fails.
#[instrument(skip(api))]
pub async fn list_products(
    api: &ApiClient,
    sort: Option<SortOrder>,
) -> Result<Vec<Product>, CatalogError> {
    let endpoint = sort.map_or_else(
        || "/products".to_string(),
        |order| format!("/products?sort={}", order.as_str()),
    );
    let body: Value = api.get(&endpoint, None).await?;

    let Value::Array(records) = body else {
        warn!("Product listing is not an array, treating as empty");
        return Ok(Vec::new());
    };

    Ok(records
        .into_iter()
        .filter_map(|record| match Product::from_raw(record) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(error = %e, "Skipping product record");
                None
            }
        })
        .collect())
}

/// Create a product (admin).
///
/// # Errors
///
/// Returns `CatalogError::Api` if the backend rejects the request and
/// `CatalogError::UnexpectedRecord` if the created record is unusable.
#[instrument(skip(api, token), fields(sku = %input.sku))]
pub async fn create_product(
    api: &ApiClient,
    input: &ProductInput,
    token: &SecretString,
) -> Result<Product, CatalogError> {
    let created: Value = api.post("/products", input, Some(token)).await?;
    Product::from_raw(created)
}

/// Replace a product's fields (admin).
///
/// # Errors
///
/// See [`create_product`].
#[instrument(skip(api, input, token))]
pub async fn update_product(
    api: &ApiClient,
    id: &str,
    input: &ProductInput,
    token: &SecretString,
) -> Result<Product, CatalogError> {
    let updated: Value = api
        .put(&format!("/products/{id}"), input, Some(token))
        .await?;
    Product::from_raw(updated)
}

/// Delete a product (admin). The response body is ignored.
///
/// # Errors
///
/// Returns `CatalogError::Api` if the backend rejects the request.
#[instrument(skip(api, token))]
pub async fn delete_product(
    api: &ApiClient,
    id: &str,
    token: &SecretString,
) -> Result<(), CatalogError> {
    let _: Value = api.delete(&format!("/products/{id}"), Some(token)).await?;
    Ok(())
}

// =============================================================================
// Client-side browsing
// =============================================================================

/// Products whose name or SKU contains `search` (case-insensitive) and whose
/// category equals `category`. Empty filters match everything.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    search: Option<&str>,
    category: Option<&str>,
) -> Vec<&'a Product> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let category = category.filter(|c| !c.is_empty());

    products
        .iter()
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.name.to_lowercase().contains(n) || p.sku.to_lowercase().contains(n)
            })
        })
        .filter(|p| category.is_none_or(|c| p.category == c))
        .collect()
}

/// Distinct categories in first-seen order.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for product in products {
        if !seen.contains(&product.category.as_str()) {
            seen.push(&product.category);
        }
    }
    seen
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(id: &str, sku: &str, name: &str, category: &str) -> Product {
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            price: d("1"),
            category: category.to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_from_raw_prefers_mongo_id() {
        let p = Product::from_raw(json!({
            "_id": "665f1c", "id": 3, "sku": "P001", "name": "Widget",
            "price": 19.99, "category": "Tools", "updatedAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(p.id, "665f1c");
        assert_eq!(p.price, d("19.99"));
        assert_eq!(p.updated_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_from_raw_numeric_id_and_string_price() {
        let p = Product::from_raw(json!({
            "id": 12, "sku": "P002", "name": "Gadget", "price": "5.50", "category": "Toys"
        }))
        .unwrap();
        assert_eq!(p.id, "12");
        assert_eq!(p.price, d("5.50"));
        assert_eq!(p.updated_at, None);
    }

    #[test]
    fn test_from_raw_rejects_missing_id_or_bad_price() {
        assert!(Product::from_raw(json!({"sku": "X", "price": 1})).is_err());
        assert!(Product::from_raw(json!({"id": "1", "price": "cheap"})).is_err());
        assert!(Product::from_raw(json!({"id": "1"})).is_err());
        assert!(Product::from_raw(json!("not an object")).is_err());
    }

    #[test]
    fn test_product_input_trims_and_validates() {
        let input = ProductInput::new(" P001 ", " Widget ", d("9.99"), " Tools ").unwrap();
        assert_eq!(input.sku(), "P001");
        assert_eq!(input.name(), "Widget");
        assert_eq!(input.category(), "Tools");
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"sku": "P001", "name": "Widget", "price": 9.99, "category": "Tools"})
        );

        assert!(matches!(
            ProductInput::new("", "Widget", d("1"), "Tools"),
            Err(CatalogError::InvalidInput("sku"))
        ));
        assert!(matches!(
            ProductInput::new("P1", "Widget", d("1"), "  "),
            Err(CatalogError::InvalidInput("category"))
        ));
        assert!(matches!(
            ProductInput::new("P1", "Widget", d("-1"), "Tools"),
            Err(CatalogError::InvalidInput("price"))
        ));
    }

    #[test]
    fn test_filter_products() {
        let products = vec![
            product("1", "KB-01", "Mechanical Keyboard", "Electronics"),
            product("2", "MS-01", "Mouse", "Electronics"),
            product("3", "MUG-7", "Coffee Mug", "Kitchen"),
        ];

        let ids = |found: Vec<&Product>| found.iter().map(|p| p.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(filter_products(&products, None, None)), ["1", "2", "3"]);
        assert_eq!(ids(filter_products(&products, Some("mOuSe"), None)), ["2"]);
        assert_eq!(ids(filter_products(&products, Some("mug-"), None)), ["3"]);
        assert_eq!(
            ids(filter_products(&products, Some("m"), Some("Electronics"))),
            ["1", "2"]
        );
        assert_eq!(ids(filter_products(&products, Some(""), Some(""))), ["1", "2", "3"]);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let products = vec![
            product("1", "a", "a", "Kitchen"),
            product("2", "b", "b", "Electronics"),
            product("3", "c", "c", "Kitchen"),
        ];
        assert_eq!(categories(&products), vec!["Kitchen", "Electronics"]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default().as_str(), "desc");
    }
}
