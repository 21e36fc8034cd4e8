//! Admin commands: catalog management and the sales dashboard.
//!
//! Every command requires a logged-in admin session.

use shopfront_client::catalog::{self, ProductInput};
use shopfront_client::reports::{self, Entry};

use super::{App, CommandError, money, out};

/// Create a product.
pub async fn create_product(app: &App, input: &ProductInput) -> Result<(), CommandError> {
    let session = app.session.require_admin()?;
    let product = catalog::create_product(&app.api, input, &session.token).await?;
    tracing::info!(id = %product.id, sku = %product.sku, "Product created");
    out(format_args!("Created product {} ({})", product.id, product.name))
}

/// Replace a product's fields.
pub async fn update_product(app: &App, id: &str, input: &ProductInput) -> Result<(), CommandError> {
    let session = app.session.require_admin()?;
    let product = catalog::update_product(&app.api, id, input, &session.token).await?;
    tracing::info!(id = %product.id, "Product updated");
    out(format_args!("Updated product {} ({})", product.id, product.name))
}

/// Delete a product.
pub async fn delete_product(app: &App, id: &str) -> Result<(), CommandError> {
    let session = app.session.require_admin()?;
    catalog::delete_product(&app.api, id, &session.token).await?;
    tracing::info!(id, "Product deleted");
    out(format_args!("Deleted product {id}"))
}

/// Print the sales dashboard.
pub async fn dashboard(app: &App) -> Result<(), CommandError> {
    let session = app.session.require_admin()?;
    let report = reports::dashboard(&app.api, &session.token).await?;

    out("Daily revenue")?;
    for entry in &report.daily_revenue {
        match entry {
            Entry::Parsed(day) => out(format_args!("  {:<12} {:>12}", day.date, money(day.revenue)))?,
            Entry::Unparsable(raw) => out(format_args!("  ?? {raw}"))?,
        }
    }

    out("Top customers")?;
    for entry in &report.top_customers {
        match entry {
            Entry::Parsed(c) => out(format_args!(
                "  {:<24} {:>4} orders {:>12}",
                c.name,
                c.orders,
                money(c.spent)
            ))?,
            Entry::Unparsable(raw) => out(format_args!("  ?? {raw}"))?,
        }
    }

    out("Category sales")?;
    for entry in &report.category_sales {
        match entry {
            Entry::Parsed(c) => out(format_args!(
                "  {:<16} {:>12} {:>6} items  avg {:>10}",
                c.category,
                money(c.total_sales),
                c.items_sold,
                money(c.avg_price)
            ))?,
            Entry::Unparsable(raw) => out(format_args!("  ?? {raw}"))?,
        }
    }
    Ok(())
}
