//! Url-encoded submission body for the order form.

use serde_json::json;

use crate::config::FieldMapping;
use crate::domain::aggregates::{CartItem, Order};
use crate::domain::value_objects::Money;

/// Human-readable order summary: one line per item, then the totals.
pub fn order_summary(order: &Order, shipping: Money) -> String {
    let subtotal = order.subtotal();
    let mut lines: Vec<String> = order
        .items
        .iter()
        .map(|item| format!("{} x {} = {}", item.product.name, item.quantity, item.line_total()))
        .collect();
    lines.push(format!("Subtotal: {subtotal}"));
    lines.push(format!("Shipping: {shipping}"));
    lines.push(format!("Total: {}", subtotal.add(shipping)));
    lines.join("\n")
}

/// Field id for an item: the known-product table first (exact, then
/// case-insensitive containment), else `product_details + index`.
pub fn product_field_id(fields: &FieldMapping, name: &str, index: usize) -> String {
    if let Some((_, id)) = fields.product_fields.iter().find(|(known, _)| known == name) {
        return id.clone();
    }
    let lowered = name.to_lowercase();
    if let Some((_, id)) = fields.product_fields.iter().find(|(known, _)| lowered.contains(&known.to_lowercase())) {
        return id.clone();
    }
    (u64::from(fields.product_details) + index as u64).to_string()
}

/// Every form pair in submission order, starting with `apiKey`.
pub fn order_fields(order: &Order, api_key: &str, fields: &FieldMapping, shipping: Money) -> Vec<(String, String)> {
    let submission = |id: &str| format!("submission[{id}]");
    let mut pairs = vec![
        ("apiKey".to_string(), api_key.to_string()),
        (submission(&fields.full_name), order.customer.name.clone()),
        (submission(&fields.address), order.customer.address.clone()),
        (submission(&fields.order_summary), order_summary(order, shipping)),
        (submission(&fields.total_amount), order.subtotal().add(shipping).to_string()),
    ];

    for (index, item) in order.items.iter().enumerate() {
        let id = product_field_id(fields, &item.product.name, index);
        pairs.push((submission(&format!("{id}_name")), item.product.name.clone()));
        pairs.push((submission(&format!("{id}_quantity")), item.quantity.to_string()));
        pairs.push((submission(&format!("{id}_price")), item.product.price.amount().normalize().to_string()));
        pairs.push((submission(&id), item_json(item)));
    }

    pairs.push((submission("new"), "1".to_string()));
    pairs.push((submission("flag"), "0".to_string()));
    pairs.push((submission("products"), serde_json::to_string(&order.items).unwrap_or_else(|_| "[]".to_string())));
    pairs
}

fn item_json(item: &CartItem) -> String {
    json!({
        "name": item.product.name,
        "quantity": item.quantity,
        "price": item.product.price,
        "total": item.line_total().plain(),
    })
    .to_string()
}
