//! Cart and checkout commands.

use shopfront_client::catalog;
use shopfront_core::CartItem;

use super::{App, CommandError, money, out};

/// Print the cart with line totals.
pub fn show(app: &App) -> Result<(), CommandError> {
    if app.cart.is_empty() {
        return out("Cart is empty");
    }
    for item in app.cart.items() {
        out(format_args!(
            "{:<26} {:<30} {:>4} x {:>10} = {:>10}",
            item.product_id,
            item.name,
            item.quantity,
            money(item.price),
            item.line_total().map_or_else(|| "-".to_string(), money)
        ))?;
    }
    out(format_args!(
        "{} items, total {}",
        app.cart.item_count(),
        money(app.cart.total())
    ))
}

/// Look up a catalog product and add it to the cart.
pub async fn add(app: &mut App, product_id: &str, quantity: u32) -> Result<(), CommandError> {
    let products = catalog::list_products(&app.api, None).await?;
    let product = products
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| CommandError::ProductNotFound(product_id.to_string()))?;

    let item = CartItem::new(&product.id, &product.name, product.price, quantity)
        .map_err(shopfront_client::CartError::from)?;
    app.cart.add_item(item)?;
    out(format_args!(
        "Added {quantity} x {}. Cart total {}",
        product.name,
        money(app.cart.total())
    ))
}

/// Remove a product from the cart.
pub fn remove(app: &mut App, product_id: &str) -> Result<(), CommandError> {
    app.cart.remove_item(product_id)?;
    out(format_args!("Cart total {}", money(app.cart.total())))
}

/// Set a product's quantity.
pub fn update(app: &mut App, product_id: &str, quantity: i64) -> Result<(), CommandError> {
    app.cart.update_quantity(product_id, quantity)?;
    out(format_args!("Cart total {}", money(app.cart.total())))
}

/// Empty the cart.
pub fn clear(app: &mut App) -> Result<(), CommandError> {
    app.cart.clear()?;
    out("Cart cleared")
}

/// Order everything in the cart.
pub async fn checkout(app: &mut App) -> Result<(), CommandError> {
    let total = app.cart.total();
    let order = shopfront_client::checkout::checkout(&app.api, &app.session, &mut app.cart).await?;

    let order_id = order
        .get("orderId")
        .or_else(|| order.get("id"))
        .map_or_else(String::new, |id| format!(" #{id}"));
    out(format_args!("Order{order_id} placed, total {}", money(total)))
}
