//! Order history.

use chrono::NaiveDate;
use shopfront_client::orders;

use super::{App, CommandError, money, out};

/// Print the logged-in user's orders, newest ID last.
pub async fn list(app: &App, date: Option<NaiveDate>) -> Result<(), CommandError> {
    let session = app.session.require_session()?;
    let lines = orders::list_orders(&app.api, session.user.id, date, &session.token).await?;
    let grouped = orders::group_orders(lines);

    if grouped.is_empty() {
        return out("No orders found");
    }
    for order in &grouped {
        out(format_args!(
            "Order #{}  {}  total {}",
            order.order_id,
            order.created_at().unwrap_or("-"),
            money(order.total())
        ))?;
        for line in &order.lines {
            out(format_args!(
                "    {:<26} {:>4} x {:>10} = {:>10}",
                line.product_id,
                line.quantity,
                money(line.price_at_purchase),
                line.line_total().map_or_else(|| "-".to_string(), money)
            ))?;
        }
    }
    Ok(())
}
