//! Admin sales dashboard.
//!
//! The dashboard payload has drifted between backend versions, so each entry
//! is matched against the known field spellings and turned into a canonical
//! record. Entries that fit none of them are kept as [`Entry::Unparsable`]
//! instead of being silently zeroed.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::amount;
use crate::api::{ApiClient, ApiError};

/// A normalized dashboard entry, or the raw JSON it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
    Parsed(T),
    Unparsable(Value),
}

impl<T> Entry<T> {
    /// The parsed record, if any.
    #[must_use]
    pub const fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed(record) => Some(record),
            Self::Unparsable(_) => None,
        }
    }
}

/// Revenue for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: Decimal,
}

/// A customer ranked by spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopCustomer {
    pub name: String,
    pub orders: u64,
    pub spent: Decimal,
}

/// Sales for one product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: Decimal,
    pub items_sold: u64,
    pub avg_price: Decimal,
}

/// The full dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardReport {
    pub daily_revenue: Vec<Entry<DailyRevenue>>,
    pub top_customers: Vec<Entry<TopCustomer>>,
    pub category_sales: Vec<Entry<CategorySales>>,
}

impl DashboardReport {
    /// Normalize a raw dashboard body. Missing or non-array sections are
    /// empty.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        Self {
            daily_revenue: section(body, "dailyRevenue", daily_revenue),
            top_customers: section(body, "topCustomers", top_customer),
            category_sales: section(body, "categorySales", category_sales),
        }
    }

    /// Number of entries that could not be normalized.
    #[must_use]
    pub fn unparsable_count(&self) -> usize {
        unparsable(&self.daily_revenue)
            + unparsable(&self.top_customers)
            + unparsable(&self.category_sales)
    }
}

/// Fetch and normalize the dashboard (admin).
///
/// # Errors
///
/// Returns an error if the request fails or the body is not JSON.
#[instrument(skip_all)]
pub async fn dashboard(api: &ApiClient, token: &SecretString) -> Result<DashboardReport, ApiError> {
    let body: Value = api.get("/products/dashboard", Some(token)).await?;
    let report = DashboardReport::from_json(&body);

    let unparsable = report.unparsable_count();
    if unparsable > 0 {
        warn!(unparsable, "Dashboard contained entries in an unknown format");
    }
    Ok(report)
}

// =============================================================================
// Normalization
// =============================================================================

fn unparsable<T>(entries: &[Entry<T>]) -> usize {
    entries
        .iter()
        .filter(|e| matches!(e, Entry::Unparsable(_)))
        .count()
}

fn section<T>(
    body: &Value,
    key: &str,
    normalize: fn(&Map<String, Value>) -> Option<T>,
) -> Vec<Entry<T>> {
    let Some(entries) = body.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|raw| match raw.as_object().and_then(normalize) {
            Some(record) => Entry::Parsed(record),
            None => {
                warn!(section = key, entry = %raw, "Unparsable dashboard entry");
                Entry::Unparsable(raw.clone())
            }
        })
        .collect()
}

/// First present, non-null field among `names`.
fn field<'a>(entry: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| entry.get(*name).filter(|v| !v.is_null()))
}

fn text(entry: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(entry, names)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn amount_of(entry: &Map<String, Value>, names: &[&str]) -> Option<Decimal> {
    field(entry, names).and_then(amount::parse_loose)
}

/// Optional count field: absent means 0, present but not a count is a
/// mismatch.
fn count_of(entry: &Map<String, Value>, names: &[&str]) -> Option<u64> {
    match field(entry, names) {
        None => Some(0),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    }
}

fn daily_revenue(entry: &Map<String, Value>) -> Option<DailyRevenue> {
    Some(DailyRevenue {
        date: text(entry, &["date"])?,
        revenue: amount_of(entry, &["revenue", "revenueAmount"])?,
    })
}

fn top_customer(entry: &Map<String, Value>) -> Option<TopCustomer> {
    Some(TopCustomer {
        name: text(entry, &["name", "userName"])?,
        orders: count_of(entry, &["orders", "totalOrders", "orderCount"])?,
        spent: amount_of(entry, &["spent", "totalSpent"])?,
    })
}

fn category_sales(entry: &Map<String, Value>) -> Option<CategorySales> {
    let category = text(entry, &["category"])?;
    let total_sales = amount_of(entry, &["totalSales", "total"])?;
    let items_sold = count_of(entry, &["itemsSold", "itemCount", "items"])?;

    let avg_price = match field(entry, &["avgPrice"]) {
        Some(raw) => amount::parse_loose(raw)?,
        None if items_sold > 0 => total_sales / Decimal::from(items_sold),
        None => Decimal::ZERO,
    };

    Some(CategorySales {
        category,
        total_sales,
        items_sold,
        avg_price,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_daily_revenue_aliases() {
        let report = DashboardReport::from_json(&json!({
            "dailyRevenue": [
                {"date": "2024-06-01", "revenue": 120.5},
                {"date": "2024-06-02", "revenueAmount": "₹1,000.25"}
            ]
        }));

        assert_eq!(
            report.daily_revenue,
            vec![
                Entry::Parsed(DailyRevenue {
                    date: "2024-06-01".to_string(),
                    revenue: d("120.5"),
                }),
                Entry::Parsed(DailyRevenue {
                    date: "2024-06-02".to_string(),
                    revenue: d("1000.25"),
                }),
            ]
        );
        assert!(report.top_customers.is_empty());
        assert!(report.category_sales.is_empty());
    }

    #[test]
    fn test_top_customer_aliases_and_default_orders() {
        let report = DashboardReport::from_json(&json!({
            "topCustomers": [
                {"userName": "Asha", "totalSpent": "250", "orderCount": 4},
                {"name": "Ben", "spent": 99}
            ]
        }));

        let customers: Vec<&TopCustomer> =
            report.top_customers.iter().filter_map(Entry::parsed).collect();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "Asha");
        assert_eq!(customers[0].orders, 4);
        assert_eq!(customers[0].spent, d("250"));
        assert_eq!(customers[1].orders, 0);
    }

    #[test]
    fn test_category_avg_price_derived() {
        let report = DashboardReport::from_json(&json!({
            "categorySales": [
                {"category": "Tools", "total": 100, "itemCount": 4},
                {"category": "Toys", "totalSales": "30", "itemsSold": 3, "avgPrice": "12.5"},
                {"category": "Misc", "totalSales": 10}
            ]
        }));

        let sales: Vec<&CategorySales> =
            report.category_sales.iter().filter_map(Entry::parsed).collect();
        assert_eq!(sales[0].avg_price, d("25"));
        assert_eq!(sales[1].avg_price, d("12.5"));
        assert_eq!(sales[2].items_sold, 0);
        assert_eq!(sales[2].avg_price, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_shapes_are_kept_raw() {
        let report = DashboardReport::from_json(&json!({
            "dailyRevenue": [
                {"day": "2024-06-01", "amount": 5},
                {"date": "2024-06-02", "revenue": "n/a"},
                "garbage"
            ],
            "topCustomers": [{"name": "Cy", "spent": 1, "orders": "many"}]
        }));

        assert_eq!(report.unparsable_count(), 4);
        assert_eq!(
            report.daily_revenue[0],
            Entry::Unparsable(json!({"day": "2024-06-01", "amount": 5}))
        );
        assert_eq!(report.daily_revenue[2], Entry::Unparsable(json!("garbage")));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        assert_eq!(DashboardReport::from_json(&json!(null)), DashboardReport::default());
        assert_eq!(
            DashboardReport::from_json(&json!({"dailyRevenue": "oops"})),
            DashboardReport::default()
        );
    }
}
