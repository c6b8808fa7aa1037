//! Menu and cart pricing commands.

use paratha_client::App;
use paratha_core::ProductId;

use super::CommandError;

/// Print the products on the menu.
#[allow(clippy::print_stdout)]
pub fn menu(app: &App) {
    for product in app.menu() {
        let bulk = product
            .bulk_price
            .map(|price| format!(" (bulk {price})"))
            .unwrap_or_default();
        println!(
            "{:>4}  {:<20} {}{bulk}",
            product.id.as_str(),
            product.name,
            product.price
        );
    }
}

/// Build a cart from `PRODUCT_ID:QUANTITY` pairs and print its totals.
#[allow(clippy::print_stdout)]
pub fn quote(app: &mut App, items: &[String]) -> Result<(), CommandError> {
    for item in items {
        let (product_id, quantity) = parse_item(item)?;
        app.add_to_cart(&product_id, quantity)?;
    }

    for line in app.cart().items() {
        println!(
            "{:<20} {:>6} x {:>8} = {:>10}",
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        );
    }

    let totals = app.order_totals();
    println!("{:<20} {:>10} items", "Count", app.cart().item_count());
    println!("{:<20} {:>10}", "Subtotal", totals.subtotal.to_string());
    println!("{:<20} {:>10}", "Delivery fee", totals.delivery_fee.to_string());
    println!("{:<20} {:>10}", "Total", totals.total.to_string());
    Ok(())
}

fn parse_item(raw: &str) -> Result<(ProductId, u32), CommandError> {
    let invalid = || CommandError::InvalidItem(raw.to_owned());
    let (id, quantity) = raw.split_once(':').ok_or_else(invalid)?;
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid());
    }
    let quantity = quantity.trim().parse().map_err(|_| invalid())?;
    Ok((ProductId::new(id), quantity))
}
