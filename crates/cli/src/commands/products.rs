//! Catalog browsing.

use shopfront_client::catalog::{self, SortOrder};

use super::{App, CommandError, money, out};

/// List products, filtered client-side.
pub async fn list(
    app: &App,
    sort: Option<SortOrder>,
    search: Option<&str>,
    category: Option<&str>,
) -> Result<(), CommandError> {
    let products = catalog::list_products(&app.api, sort).await?;
    let shown = catalog::filter_products(&products, search, category);

    if shown.is_empty() {
        return out("No products found");
    }
    for product in &shown {
        out(format_args!(
            "{:<26} {:<10} {:<30} {:>10}  {}",
            product.id,
            product.sku,
            product.name,
            money(product.price),
            product.category
        ))?;
    }
    out(format_args!(
        "{} of {} products. Categories: {}",
        shown.len(),
        products.len(),
        catalog::categories(&products).join(", ")
    ))
}
